//! Events that can occur in a session

use crate::query::{Answer, QueryError};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User intents
    Submit {
        text: String,
    },
    Clear,

    // Remote query outcomes, tagged with the generation they were issued in
    QueryAnswered {
        generation: u64,
        answer: Answer,
    },
    QueryFailed {
        generation: u64,
        error: QueryError,
    },
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::Submit { text: text.into() }
    }
}
