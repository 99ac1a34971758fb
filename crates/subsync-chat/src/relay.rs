//! Client for the SubSync backend relay.
//!
//! The relay is used when no credential is configured locally. It picks a
//! provider on the server side and answers with `{response, timestamp}`.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use subsync_core::{Error, Result};

use crate::types::{ChatMessage, RelayChatRequest, RelayChatResponse};

/// Liveness probe timeout.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct RelayClient {
    client: Client,
    base_url: String,
    credential: Option<String>,
    model_name: Option<String>,
}

impl RelayClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: None,
            model_name: None,
        }
    }

    /// Forward a credential and model hint to the relay as headers.
    pub fn with_credentials(mut self, credential: Option<&str>, model_name: Option<&str>) -> Self {
        self.credential = credential.map(str::to_string);
        self.model_name = model_name.map(str::to_string);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.credential {
            builder = builder.header("X-API-Key", key);
        }
        if let Some(model) = &self.model_name {
            builder = builder.header("X-Model-Name", model);
        }
        builder
    }

    /// `POST /chat`.
    pub async fn chat(
        &self,
        user_message: &str,
        context: &str,
        session_id: &str,
        history: &[ChatMessage],
        timeout: Option<Duration>,
    ) -> Result<RelayChatResponse> {
        let body = RelayChatRequest {
            user_message,
            context,
            session_id,
            conversation_history: history,
        };
        debug!("Relaying chat for session {} to {}", session_id, self.base_url);

        let mut builder = self.post("/chat").json(&body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Relay(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Relay(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        response
            .json::<RelayChatResponse>()
            .await
            .map_err(|e| Error::Relay(format!("Invalid response: {}", e)))
    }

    /// `POST /sync`. Best-effort: any failure is logged and discarded.
    pub async fn sync(&self, session_id: &str) -> Option<Value> {
        match self.try_sync(session_id).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Sync error (ignored): {}", e);
                None
            }
        }
    }

    async fn try_sync(&self, session_id: &str) -> reqwest::Result<Value> {
        self.post("/sync")
            .json(&json!({ "session_id": session_id }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }

    /// `GET /health` with a 3 second timeout.
    pub async fn health(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r.status().is_success(),
            Err(e) => {
                debug!("Backend health check failed: {}", e);
                false
            }
        }
    }
}
