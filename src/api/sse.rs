//! Server-Sent Events support

use crate::notify::Notification;
use crate::runtime::{SessionEvent, SessionSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Build the SSE stream: an `init` snapshot, then session changes and
/// notifications as they happen
pub fn sse_stream(
    init: SessionSnapshot,
    session_rx: broadcast::Receiver<SessionEvent>,
    notification_rx: broadcast::Receiver<Notification>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(init_to_axum(&init)) });

    let session_events = BroadcastStream::new(session_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });
    let notifications = BroadcastStream::new(notification_rx).filter_map(|result| match result {
        Ok(notification) => Some(Ok(notification_to_axum(&notification))),
        Err(_) => None,
    });

    let combined = init.chain(session_events.merge(notifications));

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_to_axum(snapshot: &SessionSnapshot) -> Event {
    let data = json!({
        "type": "init",
        "messages": snapshot.messages,
        "state": snapshot.state,
        "pending": snapshot.pending(),
    });
    Event::default().event("init").data(data.to_string())
}

fn session_event_to_axum(event: SessionEvent) -> Event {
    let (event_type, data) = match event {
        SessionEvent::MessageAppended { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SessionEvent::TranscriptReset => (
            "transcript_reset",
            json!({
                "type": "transcript_reset"
            }),
        ),
        SessionEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state,
                "pending": state.is_pending()
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}

fn notification_to_axum(notification: &Notification) -> Event {
    let data = json!({
        "type": "notification",
        "notification": notification
    });
    Event::default().event("notification").data(data.to_string())
}
