//! Process configuration from `AGENT_CHAT_*` environment variables

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:9090";
pub const DEFAULT_SESSION_ID: &str = "default";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_NOTIFY_MS: u64 = 5000;

/// Value of `AGENT_CHAT_DB_PATH` that keeps the store in memory
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the remote agent service
    pub api_url: String,
    pub request_timeout: Duration,
    pub db_path: String,
    pub session_id: String,
    pub port: u16,
    /// Display hint for notifications
    pub notification_duration: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank or unparseable values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| get(key).and_then(|v| v.trim().parse::<u64>().ok());

        let db_path = get("AGENT_CHAT_DB_PATH").unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
            format!("{home}/.agent-chat/session.db")
        });

        Self {
            api_url: get("AGENT_CHAT_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            request_timeout: Duration::from_secs(
                number("AGENT_CHAT_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            db_path,
            session_id: get("AGENT_CHAT_SESSION").unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
            port: get("AGENT_CHAT_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            notification_duration: Duration::from_millis(
                number("AGENT_CHAT_NOTIFY_MS").unwrap_or(DEFAULT_NOTIFY_MS),
            ),
        }
    }

    pub fn in_memory_db(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}
