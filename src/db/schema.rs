//! Database schema

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS session_store (
    session_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    PRIMARY KEY (session_id, key)
);
";

/// Key the serialized transcript is stored under
pub const TRANSCRIPT_KEY: &str = "conversationHistory";
