//! Transcript model
//!
//! A transcript is the append-only, ordered record of one conversation.
//! Messages are immutable once appended; ids come from a monotonic counter
//! owned by the transcript, so fast consecutive appends never collide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Error => write!(f, "error"),
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
    /// Tools the remote agent used to produce this answer (assistant only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A message that has not been appended yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub role: Role,
    pub content: String,
    pub tools: Vec<String>,
    /// Authoritative timestamp supplied by the server, if any
    pub timestamp: Option<DateTime<Utc>>,
}

impl MessageDraft {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tools: Vec::new(),
            timestamp: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        tools: Vec<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tools,
            timestamp,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: Role::Error,
            content: content.into(),
            tools: Vec::new(),
            timestamp: None,
        }
    }
}

/// Ordered, append-only sequence of messages
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a transcript from persisted messages.
    ///
    /// Ids are kept as stored; new appends continue after the highest one.
    /// History whose ids leave no room for another message is dropped.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let Some(max) = messages.iter().map(|m| m.id).max() else {
            return Self::new();
        };

        match max.checked_add(1) {
            Some(next_id) => Self { messages, next_id },
            None => {
                tracing::warn!(
                    max_id = max,
                    messages = messages.len(),
                    "Stored message ids are exhausted, starting empty"
                );
                Self::new()
            }
        }
    }

    /// Append a draft, stamping it with the next id and a timestamp.
    ///
    /// Returns the id of the new message.
    pub fn append(&mut self, draft: MessageDraft) -> u64 {
        let id = self.next_id;
        self.messages.push(Message {
            id,
            role: draft.role,
            content: draft.content,
            tools: draft.tools,
            timestamp: draft.timestamp.unwrap_or_else(Utc::now),
        });
        // Saturates only after a rehydrated id of u64::MAX - 1
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Drop every message. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
