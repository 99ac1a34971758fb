//! SubSync Store: key-value persistence and the active conversation session.

pub mod kv;
pub mod session;
pub mod snapshot;

pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use session::{generate_session_id, ConversationSession, SessionStore};
pub use snapshot::{PersistedSnapshot, SESSION_TTL_HOURS, STORAGE_PREFIX};
