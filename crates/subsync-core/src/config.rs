//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of live transcript turns sent along with each chat request.
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;

/// Paths to all SubSync data locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Session snapshot directory (`data/sessions/`).
    pub sessions: PathBuf,
    /// Chat provider configuration (`data/chat-config.json`).
    pub chat_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            sessions: root.join("sessions"),
            chat_config_file: root.join("chat-config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.sessions)?;
        Ok(paths)
    }
}

/// Top-level SubSync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubSyncConfig {
    pub data_paths: DataPaths,
    /// How many trailing transcript turns accompany each request.
    pub context_window: usize,
}

impl SubSyncConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let context_window = std::env::var("SUBSYNC_CONTEXT_WINDOW")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or(DEFAULT_CONTEXT_WINDOW);

        Ok(Self {
            data_paths: DataPaths::new(data_dir)?,
            context_window,
        })
    }
}
