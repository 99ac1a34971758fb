//! The active conversation session and its persisted history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use subsync_core::{Result, Role, Turn};

use crate::kv::KeyValueStore;
use crate::snapshot::{PersistedSnapshot, STORAGE_PREFIX};

/// Fresh session id: `session_<unix-millis>_<9 random alphanumerics>`.
pub fn generate_session_id() -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// One conversation: an id and an append-only turn list.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::with_id(generate_session_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the in-memory session, the cached transcript context and the
/// snapshot stored under `subsync_chat_<id>`.
pub struct SessionStore {
    session: ConversationSession,
    context: String,
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Start with a freshly generated session.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_session(store, ConversationSession::new())
    }

    /// Resume a known session id (its history is adopted by [`Self::load`]).
    pub fn with_session_id(store: Arc<dyn KeyValueStore>, session_id: impl Into<String>) -> Self {
        Self::with_session(store, ConversationSession::with_id(session_id))
    }

    fn with_session(store: Arc<dyn KeyValueStore>, session: ConversationSession) -> Self {
        Self {
            session,
            context: String::new(),
            store,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub fn turns(&self) -> &[Turn] {
        self.session.turns()
    }

    /// Turns to send as history. `exclude_last` drops the most recent one,
    /// which is the user message being asked right now.
    pub fn history(&self, exclude_last: bool) -> &[Turn] {
        let turns = self.session.turns();
        if exclude_last {
            &turns[..turns.len().saturating_sub(1)]
        } else {
            turns
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.context = context.into();
    }

    /// Replace the session with a fresh id and no turns. The previous
    /// snapshot stays in the store until it expires.
    pub fn new_session(&mut self) -> &str {
        self.session = ConversationSession::new();
        info!("Started new session {}", self.session.id);
        &self.session.id
    }

    /// Append a turn. `timestamp` defaults to now.
    pub fn add_turn(&mut self, role: Role, content: impl Into<String>, timestamp: Option<DateTime<Utc>>) {
        let turn = Turn::at(role, content, timestamp.unwrap_or_else(Utc::now));
        self.session.push(turn);
    }

    /// Write the current turns under this session's key.
    pub fn persist(&self) -> Result<()> {
        let snapshot = PersistedSnapshot {
            session_id: self.session.id.clone(),
            turns: self.session.turns().to_vec(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store
            .set(&PersistedSnapshot::key_for(&self.session.id), &json)?;
        debug!(
            "Persisted session {} ({} turns)",
            self.session.id,
            snapshot.turns.len()
        );
        Ok(())
    }

    /// Adopt the stored history for this session if it is younger than 24h.
    /// Stale or corrupt entries are deleted. Returns whether history was adopted.
    pub fn load(&mut self) -> bool {
        self.load_at(Utc::now())
    }

    pub fn load_at(&mut self, now: DateTime<Utc>) -> bool {
        let key = PersistedSnapshot::key_for(&self.session.id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!("Failed to read session snapshot {}: {}", key, e);
                return false;
            }
        };

        match PersistedSnapshot::parse(&raw) {
            Some(snapshot) if snapshot.is_fresh_at(now) => {
                info!(
                    "Restored {} turns for session {}",
                    snapshot.turns.len(),
                    self.session.id
                );
                self.session.turns = snapshot.turns;
                true
            }
            Some(_) => {
                debug!("Session snapshot {} expired, removing", key);
                self.discard(&key);
                false
            }
            None => {
                warn!("Session snapshot {} is corrupt, removing", key);
                self.discard(&key);
                false
            }
        }
    }

    /// Delete every stale or unparseable snapshot in the namespace.
    /// Returns how many entries were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let keys = match self.store.keys_with_prefix(STORAGE_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list session snapshots: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to read session snapshot {}, keeping it: {}", key, e);
                    continue;
                }
            };
            let keep = PersistedSnapshot::parse(&raw).is_some_and(|snapshot| snapshot.is_fresh_at(now));
            if !keep && self.discard(&key) {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Swept {} expired session snapshots", removed);
        }
        removed
    }

    fn discard(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(existed) => existed,
            Err(e) => {
                warn!("Failed to remove session snapshot {}: {}", key, e);
                false
            }
        }
    }
}
