//! API request and response types

use crate::query::ToolInfo;
use crate::state_machine::SessionState;
use crate::transcript::Message;
use serde::{Deserialize, Serialize};

/// Request to ask a question
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

/// Full view of the session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub messages: Vec<Message>,
    pub state: SessionState,
    pub pending: bool,
}

/// Response for submit
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for clear
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub ok: bool,
}

/// Backend reachability
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub backend_online: bool,
}

/// Tool catalogue of the remote agent
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
    pub count: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
