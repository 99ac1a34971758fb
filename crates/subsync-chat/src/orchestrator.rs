//! Routes a chat request to a provider, a failover chain, or the relay.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use subsync_core::Result;

use crate::config::{ChatConfig, DispatchStrategy};
use crate::failover::run_chain;
use crate::providers::{build_messages, call_provider, classify_provider, format_request};
use crate::relay::RelayClient;
use crate::types::{ChatReply, ChatRequest, ConfigUpdate, ProviderKind, ProviderProfile};

/// Where the next request will go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPlan {
    Direct(ProviderKind),
    Chain(Vec<ProviderKind>),
    Relay,
}

impl DispatchPlan {
    pub fn for_config(config: &ChatConfig) -> Self {
        match config.credential().and_then(classify_provider) {
            None => Self::Relay,
            Some(kind) => match config.strategy {
                DispatchStrategy::Single => Self::Direct(kind),
                DispatchStrategy::Chain => Self::Chain(config.failover_chain.clone()),
            },
        }
    }
}

pub struct ChatOrchestrator {
    config: RwLock<ChatConfig>,
    client: Client,
    profiles: HashMap<ProviderKind, ProviderProfile>,
}

impl ChatOrchestrator {
    pub fn new(config: ChatConfig) -> Self {
        let profiles = ProviderKind::all()
            .iter()
            .map(|&kind| (kind, ProviderProfile::default_for(kind)))
            .collect();
        Self {
            config: RwLock::new(config),
            client: Client::new(),
            profiles,
        }
    }

    /// Replace the profile used for `profile.kind`.
    pub fn with_profile(mut self, profile: ProviderProfile) -> Self {
        self.profiles.insert(profile.kind, profile);
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ChatConfig {
        self.config.read().clone()
    }

    pub fn has_credential(&self) -> bool {
        self.config.read().credential().is_some()
    }

    pub fn plan(&self) -> DispatchPlan {
        DispatchPlan::for_config(&self.config.read())
    }

    /// Apply a settings change. Takes effect on the next `send`; persisted
    /// when the config was loaded from a file.
    pub fn apply_update(&self, update: &ConfigUpdate) -> Result<()> {
        let mut config = self.config.write();
        config.apply_update(update);
        info!("Chat config updated: plan is now {:?}", DispatchPlan::for_config(&config));
        if !config.config_path.as_os_str().is_empty() {
            config.save()?;
        }
        Ok(())
    }

    /// Send one question and return the normalized reply.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        let config = self.config();
        let plan = DispatchPlan::for_config(&config);
        debug!("Dispatching chat for session {} via {:?}", request.session_id, plan);

        let response_text = match plan {
            DispatchPlan::Direct(kind) => self.call_direct(kind, &config, request).await?,
            DispatchPlan::Chain(chain) => {
                let config = &config;
                run_chain(&chain, move |kind| self.call_direct(kind, config, request))
                    .await
                    .into_result()?
            }
            DispatchPlan::Relay => {
                let reply = self
                    .relay(&config)
                    .chat(
                        &request.user_message,
                        &request.context,
                        &request.session_id,
                        &request.history,
                        request_timeout(&config),
                    )
                    .await?;
                let timestamp = reply
                    .timestamp
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|ts| ts.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now);
                return Ok(ChatReply {
                    response_text: reply.response,
                    timestamp,
                });
            }
        };

        Ok(ChatReply {
            response_text,
            timestamp: Utc::now(),
        })
    }

    /// Tell the relay about the active session. Best-effort.
    pub async fn sync_session(&self, session_id: &str) -> Option<Value> {
        let config = self.config();
        self.relay(&config).sync(session_id).await
    }

    /// Relay liveness probe.
    pub async fn check_health(&self) -> bool {
        let config = self.config();
        self.relay(&config).health().await
    }

    fn relay(&self, config: &ChatConfig) -> RelayClient {
        RelayClient::new(self.client.clone(), config.backend_url())
            .with_credentials(config.credential(), config.model_name())
    }

    async fn call_direct(
        &self,
        kind: ProviderKind,
        config: &ChatConfig,
        request: &ChatRequest,
    ) -> Result<String> {
        let profile = self
            .profiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| ProviderProfile::default_for(kind));
        let model = config
            .model_name()
            .unwrap_or(profile.default_model.as_str())
            .to_string();
        let credential = config.credential().unwrap_or_default();

        let messages = build_messages(&request.context, &request.history, &request.user_message);
        let prepared = format_request(
            &profile,
            &messages,
            &model,
            credential,
            request.page_url.as_deref(),
        );
        call_provider(&self.client, &profile, prepared, request_timeout(config)).await
    }
}

fn request_timeout(config: &ChatConfig) -> Option<Duration> {
    config.request_timeout_secs.map(Duration::from_secs)
}
