//! Runtime for executing a conversation session
//!
//! One executor task owns the session. Callers talk to it through a
//! cloneable [`SessionHandle`]: intents go in over an `mpsc` queue, and
//! changes come back out over a `broadcast` channel plus a `watch` snapshot.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::notify::NotificationSink;
use crate::query::QueryClient;
use crate::state_machine::{Event, SessionContext, SessionState};
use crate::transcript::{Message, Transcript};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Changes pushed to session subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    MessageAppended { message: Message },
    TranscriptReset,
    StateChange { state: SessionState },
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub state: SessionState,
}

impl SessionSnapshot {
    pub fn pending(&self) -> bool {
        self.state.is_pending()
    }
}

#[derive(Debug, Error)]
#[error("Session runtime has stopped")]
pub struct SessionClosed;

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queue a question. Rejections (blank, busy) are silent.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Event::submit(text)).await
    }

    /// Queue a transcript reset
    pub async fn clear(&self) -> Result<(), SessionClosed> {
        self.send(Event::Clear).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Latest published view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch channel that sees every published snapshot
    #[cfg(test)]
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    async fn send(&self, event: Event) -> Result<(), SessionClosed> {
        self.event_tx.send(event).await.map_err(|_| SessionClosed)
    }
}

/// Load the stored transcript and spawn the executor for one session
pub async fn start_session<S, Q, N>(
    context: SessionContext,
    store: S,
    client: Q,
    sink: N,
    shutdown: CancellationToken,
) -> SessionHandle
where
    S: TranscriptStore + 'static,
    Q: QueryClient + 'static,
    N: NotificationSink + 'static,
{
    let transcript = Transcript::from_messages(store.load().await);
    tracing::info!(
        session_id = %context.session_id,
        messages = transcript.len(),
        "Loaded session transcript"
    );

    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
        messages: transcript.messages().to_vec(),
        state: SessionState::default(),
    });

    let runtime = SessionRuntime::new(
        context,
        transcript,
        store,
        client,
        sink,
        event_rx,
        event_tx.clone(),
        broadcast_tx.clone(),
        snapshot_tx,
    );

    tokio::spawn(async move {
        runtime.run(shutdown).await;
    });

    SessionHandle {
        event_tx,
        broadcast_tx,
        snapshot_rx,
    }
}
