//! Transient user-facing notifications
//!
//! Distinct from the transcript: a notification is shown briefly and then
//! forgotten. One sink instance is built at startup and handed to the
//! session engine.

use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(dead_code)] // Info and Warning are part of the presenter contract
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// How long the presenter should keep it visible
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

fn serialize_millis<S: Serializer>(duration: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match duration {
        Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        None => s.serialize_none(),
    }
}

/// Receives notifications. Fire-and-forget, no acknowledgement.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Sink that logs and fans notifications out to any subscribed presenter
#[derive(Clone)]
pub struct ChannelSink {
    tx: broadcast::Sender<Notification>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => {
                tracing::warn!(message = %notification.message, "Error notification");
            }
            _ => {
                tracing::debug!(
                    severity = ?notification.severity,
                    message = %notification.message,
                    "Notification"
                );
            }
        }
        // No subscribers is fine: nobody is looking
        let _ = self.tx.send(notification);
    }
}
