//! Remote query client
//!
//! A single-attempt primitive: one question in, one answer or one classified
//! failure out. Retry policy, if any, belongs to the caller.

mod error;
mod http;
mod types;

pub use error::{QueryError, QueryErrorKind};
pub use http::HttpQueryClient;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Sends one question to the remote agent
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn ask(&self, question: &str) -> Result<Answer, QueryError>;

    /// Where questions are sent, for logging
    fn endpoint(&self) -> &str;
}

/// Side-channel checks against the remote service.
///
/// Nothing here influences the session engine.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Reachability check for an "offline" banner
    async fn is_healthy(&self) -> bool;

    /// Tools the remote agent can use
    async fn list_tools(&self) -> Result<Vec<ToolInfo>, QueryError>;
}

#[async_trait]
impl<T: QueryClient + ?Sized> QueryClient for Arc<T> {
    async fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        (**self).ask(question).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

#[async_trait]
impl<T: ServiceProbe + ?Sized> ServiceProbe for Arc<T> {
    async fn is_healthy(&self) -> bool {
        (**self).is_healthy().await
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>, QueryError> {
        (**self).list_tools().await
    }
}

/// Logging wrapper for query clients
pub struct LoggingClient<C> {
    inner: C,
}

impl<C: QueryClient> LoggingClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: QueryClient> QueryClient for LoggingClient<C> {
    async fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        let start = std::time::Instant::now();
        let result = self.inner.ask(question).await;
        let duration = start.elapsed();

        match &result {
            Ok(answer) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    tools = ?answer.tools,
                    "Query completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    status = ?e.status,
                    error = %e.message,
                    "Query failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
