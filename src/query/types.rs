//! Wire types for the remote question-answering service

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
}

/// Successful body of `POST /query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub tools_used: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Error body returned by the service on non-success statuses.
///
/// `detail` is a string for handled failures and a list of objects for
/// request validation failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    #[allow(dead_code)] // Informational
    pub version: Option<String>,
}

/// One entry of the remote tool catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Body of `GET /tools`
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
}

/// A normalized answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub tools: Vec<String>,
    /// Server-side timestamp, authoritative when present
    pub timestamp: Option<DateTime<Utc>>,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tools: Vec::new(),
            timestamp: None,
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }
}

impl From<QueryResponse> for Answer {
    fn from(resp: QueryResponse) -> Self {
        let timestamp = resp.timestamp.as_deref().and_then(parse_server_timestamp);
        Self {
            timestamp,
            ..Self::new(resp.answer).with_tools(resp.tools_used.unwrap_or_default())
        }
    }
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 and naive ISO-8601 (`2025-11-13T12:00:00.000000`), the
/// latter interpreted as UTC.
pub fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Text to show for a rejected request
pub fn rejection_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        });
    detail.unwrap_or_else(|| format!("API error: {status}"))
}
