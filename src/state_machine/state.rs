//! Session state types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine-level session state.
///
/// `generation` tags issued requests. It only ever grows, so a response
/// carrying an older generation belongs to a request the session has
/// abandoned (e.g. through `clear`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Ready for user input, no request in flight
    Idle { generation: u64 },

    /// Exactly one request in flight
    AwaitingResponse { generation: u64 },
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle { generation: 0 }
    }
}

impl SessionState {
    /// True while a request is in flight
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::AwaitingResponse { .. })
    }

    pub fn generation(&self) -> u64 {
        match self {
            SessionState::Idle { generation } | SessionState::AwaitingResponse { generation } => {
                *generation
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle { .. } => "idle",
            SessionState::AwaitingResponse { .. } => "awaiting_response",
        }
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Display hint attached to every notification the engine emits
    pub notification_duration: Duration,
}

/// Default notification display time
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }
}
