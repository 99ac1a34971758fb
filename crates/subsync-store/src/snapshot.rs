//! Persisted session snapshots and their 24-hour validity window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use subsync_core::Turn;

/// Namespace for every key this system writes.
pub const STORAGE_PREFIX: &str = "subsync_chat_";

/// Snapshots at least this old are stale.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Stored form of a session's turn history.
///
/// Older writers used `messages`/`timestamp`; both spellings are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
    #[serde(alias = "messages", default)]
    pub turns: Vec<Turn>,
    #[serde(rename = "savedAt", alias = "timestamp")]
    pub saved_at: DateTime<Utc>,
}

impl PersistedSnapshot {
    pub fn key_for(session_id: &str) -> String {
        format!("{}{}", STORAGE_PREFIX, session_id)
    }

    pub fn ttl() -> Duration {
        Duration::hours(SESSION_TTL_HOURS)
    }

    /// Parse a stored value. Anything unparseable is treated as corrupt.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Valid while strictly younger than the TTL.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now - self.saved_at < Self::ttl()
    }
}
