//! Session runtime executor

use super::traits::TranscriptStore;
use super::{SessionEvent, SessionSnapshot};

use crate::notify::NotificationSink;
use crate::query::QueryClient;
use crate::state_machine::{transition, Effect, Event, SessionContext, SessionState, TransitionError};
use crate::transcript::Transcript;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generic session runtime that can work with any store, client and sink
pub struct SessionRuntime<S, Q, N>
where
    S: TranscriptStore + 'static,
    Q: QueryClient + 'static,
    N: NotificationSink + 'static,
{
    context: SessionContext,
    state: SessionState,
    transcript: Transcript,
    store: S,
    client: Arc<Q>,
    sink: N,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<S, Q, N> SessionRuntime<S, Q, N>
where
    S: TranscriptStore + 'static,
    Q: QueryClient + 'static,
    N: NotificationSink + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: SessionContext,
        transcript: Transcript,
        store: S,
        client: Q,
        sink: N,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            context,
            state: SessionState::default(),
            transcript,
            store,
            client: Arc::new(client),
            sink,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        // Events are handled one at a time; the remote call is the only
        // thing that runs outside this loop.
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event).await,
                    None => break,
                },
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, &self.context, &self.transcript, event) {
            Ok(r) => r,
            Err(e) => {
                log_rejection(&self.context.session_id, &e);
                return;
            }
        };

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        self.publish_snapshot();
        if old_state != self.state {
            tracing::debug!(
                session_id = %self.context.session_id,
                from = old_state.name(),
                to = self.state.name(),
                generation = self.state.generation(),
                "State transition"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect).await;
        }
    }

    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage(draft) => {
                let role = draft.role;
                let id = self.transcript.append(draft);
                self.publish_snapshot();
                tracing::debug!(
                    session_id = %self.context.session_id,
                    id,
                    %role,
                    "Message appended"
                );
            }

            Effect::ResetTranscript => {
                self.transcript.clear();
                self.publish_snapshot();
            }

            Effect::PersistTranscript => {
                // Memory stays authoritative; a failed write only costs durability
                if let Err(e) = self.store.save(self.transcript.messages()).await {
                    tracing::warn!(
                        session_id = %self.context.session_id,
                        error = %e,
                        "Failed to persist transcript"
                    );
                }
            }

            Effect::NotifyAppended => {
                if let Some(message) = self.transcript.last() {
                    let _ = self.broadcast_tx.send(SessionEvent::MessageAppended {
                        message: message.clone(),
                    });
                }
            }

            Effect::NotifyReset => {
                let _ = self.broadcast_tx.send(SessionEvent::TranscriptReset);
            }

            Effect::NotifyStateChange => {
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::StateChange { state: self.state });
            }

            Effect::Notify(notification) => self.sink.notify(notification),

            Effect::AskRemote {
                generation,
                question,
            } => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    tracing::info!(%session_id, generation, "Asking remote agent (background)");

                    let event = match client.ask(&question).await {
                        Ok(answer) => Event::QueryAnswered { generation, answer },
                        Err(error) => Event::QueryFailed { generation, error },
                    };

                    // The runtime may have shut down while we waited
                    if event_tx.send(event).await.is_err() {
                        tracing::debug!(%session_id, generation, "Runtime gone, dropping query outcome");
                    }
                });
            }
        }
    }

    /// Must run before the matching broadcast, so a subscriber that reads
    /// the snapshot right after subscribing cannot miss a change.
    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            messages: self.transcript.messages().to_vec(),
            state: self.state,
        });
    }
}

fn log_rejection(session_id: &str, error: &TransitionError) {
    match error {
        TransitionError::StaleResponse(generation) => {
            tracing::info!(%session_id, generation, "Discarding stale query outcome");
        }
        _ => tracing::debug!(%session_id, reason = %error, "Event ignored"),
    }
}
