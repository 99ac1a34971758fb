//! Chat configuration persistence: credential, model, relay address, failover.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{ConfigUpdate, ProviderKind};

pub const DEFAULT_BACKEND_URL: &str = "https://subsync-backend.vercel.app";

/// What to do when a credential is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// Only the provider the credential belongs to.
    #[default]
    Single,
    /// Walk `failover_chain` until one provider answers.
    Chain,
}

/// Stored chat configuration (persisted to chat-config.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default)]
    pub strategy: DispatchStrategy,
    #[serde(default = "default_failover_chain")]
    pub failover_chain: Vec<ProviderKind>,
    /// Per-attempt timeout for provider calls. Unset means wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.into()
}
fn default_failover_chain() -> Vec<ProviderKind> {
    vec![ProviderKind::OpenRouter, ProviderKind::MegaLLM]
}

/// Trim, and treat blank as absent.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            credential: None,
            model_name: None,
            backend_url: DEFAULT_BACKEND_URL.into(),
            strategy: DispatchStrategy::Single,
            failover_chain: default_failover_chain(),
            request_timeout_secs: None,
            config_path: PathBuf::new(),
        }
    }
}

impl ChatConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: ChatConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();

        // Env vars as fallback
        if normalize(config.credential.clone()).is_none() {
            config.credential = std::env::var("SUBSYNC_API_KEY").ok();
        }
        if normalize(config.model_name.clone()).is_none() {
            config.model_name = std::env::var("SUBSYNC_MODEL").ok();
        }
        if let Ok(url) = std::env::var("SUBSYNC_BACKEND_URL") {
            if !url.trim().is_empty() {
                config.backend_url = url.trim().to_string();
            }
        }

        config.credential = normalize(config.credential);
        config.model_name = normalize(config.model_name);
        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved chat config to {}", self.config_path.display());
        Ok(())
    }

    /// Apply a settings change. A present field replaces the stored value,
    /// and a blank one clears it.
    pub fn apply_update(&mut self, update: &ConfigUpdate) {
        if let Some(credential) = &update.credential {
            self.credential = normalize(Some(credential.clone()));
        }
        if let Some(model) = &update.model_name {
            self.model_name = normalize(Some(model.clone()));
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    pub fn backend_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}
