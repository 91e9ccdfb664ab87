//! Trait abstractions for runtime I/O
//!
//! The executor only sees these traits, so tests can swap in the mocks from
//! `runtime::testing`.

use crate::db::{Database, TRANSCRIPT_KEY};
use crate::transcript::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable snapshot storage for one session's transcript
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Replace the stored snapshot with `messages`
    async fn save(&self, messages: &[Message]) -> Result<(), String>;

    /// Load the stored snapshot. Missing or unreadable data loads as empty.
    async fn load(&self) -> Vec<Message>;
}

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    async fn save(&self, messages: &[Message]) -> Result<(), String> {
        (**self).save(messages).await
    }

    async fn load(&self) -> Vec<Message> {
        (**self).load().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as a TranscriptStore
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
    session_id: String,
}

impl DatabaseStore {
    pub fn new(db: Database, session_id: impl Into<String>) -> Self {
        Self {
            db,
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
impl TranscriptStore for DatabaseStore {
    async fn save(&self, messages: &[Message]) -> Result<(), String> {
        let json = serde_json::to_string(messages).map_err(|e| e.to_string())?;
        self.db
            .put_value(&self.session_id, TRANSCRIPT_KEY, &json)
            .map_err(|e| e.to_string())
    }

    async fn load(&self) -> Vec<Message> {
        let raw = match self.db.get_value(&self.session_id, TRANSCRIPT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "Failed to read stored transcript");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    "Stored transcript is corrupt, starting empty"
                );
                Vec::new()
            }
        }
    }
}
