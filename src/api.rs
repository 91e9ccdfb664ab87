//! HTTP API for the chat session
//!
//! A thin presentation boundary: handlers translate requests into session
//! intents and stream session changes back out over SSE.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::notify::ChannelSink;
use crate::query::ServiceProbe;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub probe: Arc<dyn ServiceProbe>,
    pub notifications: ChannelSink,
}

impl AppState {
    pub fn new(session: SessionHandle, probe: Arc<dyn ServiceProbe>, notifications: ChannelSink) -> Self {
        Self {
            session,
            probe,
            notifications,
        }
    }
}
