//! Process-wide runtime state: data paths, the snapshot store and the
//! chat orchestrator, opened once and shared by every surface.

use std::sync::Arc;

use tracing::info;

use subsync_chat::{ChatConfig, ChatOrchestrator};
use subsync_core::{Result, SubSyncConfig};
use subsync_store::{KeyValueStore, SessionStore, SqliteKvStore};

use crate::source::PageSource;
use crate::surface::InteractionSurface;

pub struct RuntimeContext {
    config: SubSyncConfig,
    store: Arc<dyn KeyValueStore>,
    orchestrator: Arc<ChatOrchestrator>,
    swept_on_open: usize,
}

impl RuntimeContext {
    /// Open the on-disk store and chat config, then purge expired snapshots.
    pub fn open(config: SubSyncConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(SqliteKvStore::open(&config.data_paths.sessions)?);
        let chat_config = ChatConfig::load(&config.data_paths.chat_config_file);
        let orchestrator = Arc::new(ChatOrchestrator::new(chat_config));

        let mut ctx = Self::with_parts(config, store, orchestrator);
        let removed = ctx.sweep_expired();
        ctx.swept_on_open = removed;
        info!(
            "Runtime ready at {} ({} expired snapshots removed, plan={:?})",
            ctx.config.data_paths.root.display(),
            removed,
            ctx.orchestrator.plan()
        );
        Ok(ctx)
    }

    pub fn with_parts(
        config: SubSyncConfig,
        store: Arc<dyn KeyValueStore>,
        orchestrator: Arc<ChatOrchestrator>,
    ) -> Self {
        Self {
            config,
            store,
            orchestrator,
            swept_on_open: 0,
        }
    }

    pub fn config(&self) -> &SubSyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Arc<ChatOrchestrator> {
        &self.orchestrator
    }

    /// Snapshots removed by the sweep in [`Self::open`].
    pub fn swept_on_open(&self) -> usize {
        self.swept_on_open
    }

    /// Delete stale and unreadable snapshots. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        SessionStore::new(self.store.clone()).sweep_expired()
    }

    /// Build a surface over `source`, resuming `session_id` when given.
    pub fn surface(&self, source: Box<dyn PageSource>, session_id: Option<&str>) -> InteractionSurface {
        let sessions = match session_id {
            Some(id) => SessionStore::with_session_id(self.store.clone(), id),
            None => SessionStore::new(self.store.clone()),
        };
        InteractionSurface::new(
            self.orchestrator.clone(),
            sessions,
            source,
            self.config.context_window,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticPage;
    use subsync_store::PersistedSnapshot;

    #[test]
    fn test_open_sweeps_expired_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let config = SubSyncConfig::from_env(dir.path()).unwrap();
        {
            let store = SqliteKvStore::open(&config.data_paths.sessions).unwrap();
            store
                .set(
                    &PersistedSnapshot::key_for("session_old"),
                    r#"{"turns": [], "savedAt": "2020-01-01T00:00:00Z"}"#,
                )
                .unwrap();
            store.set(&PersistedSnapshot::key_for("session_bad"), "not json").unwrap();
            store.set("unrelated", "kept").unwrap();
        }

        let ctx = RuntimeContext::open(config).unwrap();
        let keys = ctx.store().keys_with_prefix("").unwrap();
        assert_eq!(keys, vec!["unrelated".to_string()]);
        assert_eq!(ctx.swept_on_open(), 2);
        assert_eq!(ctx.sweep_expired(), 0);
        assert!(ctx.config().data_paths.sessions.join("subsync.db").exists());
    }

    #[test]
    fn test_surface_resumes_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RuntimeContext::open(SubSyncConfig::from_env(dir.path()).unwrap()).unwrap();

        let resumed = ctx.surface(
            Box::new(StaticPage::new("claude.ai", "<main></main>")),
            Some("session_1_abc"),
        );
        assert_eq!(resumed.session_id(), "session_1_abc");

        let fresh = ctx.surface(Box::new(StaticPage::new("claude.ai", "")), None);
        assert!(fresh.session_id().starts_with("session_"));
        assert_ne!(fresh.session_id(), "session_1_abc");
    }
}
