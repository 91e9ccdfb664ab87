//! Query error types

use thiserror::Error;

/// Failure of a single remote query, with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    /// Human-readable description, shown in the transcript as-is
    pub message: String,
    /// HTTP status, when the remote answered at all
    pub status: Option<u16>,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Unreachable, message)
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::ServerRejected, message).with_status(status)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Malformed, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Connection refused, DNS failure, timeout, or the body could not be read
    Unreachable,
    /// The remote answered with a non-success status
    ServerRejected,
    /// A success response whose body did not have the expected shape
    Malformed,
}

impl QueryErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::ServerRejected => "server_rejected",
            Self::Malformed => "malformed",
        }
    }
}
