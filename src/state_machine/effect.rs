//! Effects produced by state transitions

use crate::notify::{Notification, Severity};
use crate::transcript::MessageDraft;
use std::time::Duration;

/// Effects to be executed, in order, after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the in-memory transcript
    AppendMessage(MessageDraft),

    /// Drop every message from the in-memory transcript
    ResetTranscript,

    /// Write the full transcript snapshot to the store
    PersistTranscript,

    /// Tell subscribers about the most recently appended message
    NotifyAppended,

    /// Tell subscribers the transcript was reset
    NotifyReset,

    /// Tell subscribers the pending state changed
    NotifyStateChange,

    /// Raise a transient notification
    Notify(Notification),

    /// Issue the single remote query for this generation
    AskRemote { generation: u64, question: String },
}

impl Effect {
    pub fn notify(message: impl Into<String>, severity: Severity, duration: Duration) -> Self {
        Effect::Notify(Notification::new(message, severity).with_duration(duration))
    }

    #[cfg(test)]
    pub fn is_persist(&self) -> bool {
        matches!(self, Effect::PersistTranscript)
    }
}
