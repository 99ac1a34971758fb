//! Chat types and static provider profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use subsync_core::Turn;

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
    OpenRouter,
    #[serde(rename = "megallm")]
    MegaLLM,
}

impl ProviderKind {
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::OpenAI,
            Self::Anthropic,
            Self::Gemini,
            Self::OpenRouter,
            Self::MegaLLM,
        ]
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Gemini",
            Self::OpenRouter => "OpenRouter",
            Self::MegaLLM => "MegaLLM",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Gemini => write!(f, "gemini"),
            Self::OpenRouter => write!(f, "openrouter"),
            Self::MegaLLM => write!(f, "megallm"),
        }
    }
}

/// How the credential is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `x-api-key: <key>`
    ApiKeyHeader,
    /// `?key=<key>` on the URL
    QueryKey,
}

/// Request body layout a provider family expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// `{model, messages}` with the system entry inside the list.
    FlatWithSystem,
    /// `{model, max_tokens, system, messages}` with system lifted out.
    SeparateSystem,
    /// `{contents: [{role, parts: [{text}]}]}`, system merged into the first turn.
    MergedParts,
}

/// Static description of one provider endpoint.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub endpoint: String,
    pub auth_scheme: AuthScheme,
    pub default_model: String,
    pub request_shape: RequestShape,
    /// Fixed headers sent on every request.
    pub extra_headers: Vec<(String, String)>,
}

impl ProviderProfile {
    /// Public endpoint and defaults for a provider.
    pub fn default_for(kind: ProviderKind) -> Self {
        let (endpoint, auth_scheme, default_model, request_shape) = match kind {
            ProviderKind::OpenAI => (
                "https://api.openai.com/v1/chat/completions",
                AuthScheme::Bearer,
                "gpt-4o-mini",
                RequestShape::FlatWithSystem,
            ),
            ProviderKind::Anthropic => (
                "https://api.anthropic.com/v1/messages",
                AuthScheme::ApiKeyHeader,
                "claude-sonnet-4-20250514",
                RequestShape::SeparateSystem,
            ),
            ProviderKind::Gemini => (
                "https://generativelanguage.googleapis.com/v1beta/models",
                AuthScheme::QueryKey,
                "gemini-1.5-flash",
                RequestShape::MergedParts,
            ),
            ProviderKind::OpenRouter => (
                "https://openrouter.ai/api/v1/chat/completions",
                AuthScheme::Bearer,
                "openai/gpt-4o-mini-2024-07-18",
                RequestShape::FlatWithSystem,
            ),
            ProviderKind::MegaLLM => (
                "https://ai.megallm.io/v1/chat/completions",
                AuthScheme::Bearer,
                "openai-gpt-oss-20b",
                RequestShape::FlatWithSystem,
            ),
        };

        let extra_headers = match kind {
            ProviderKind::Anthropic => vec![("anthropic-version".into(), "2023-06-01".into())],
            ProviderKind::OpenRouter => vec![("X-Title".into(), "SubSync Extension".into())],
            _ => Vec::new(),
        };

        Self {
            kind,
            endpoint: endpoint.into(),
            auth_scheme,
            default_model: default_model.into(),
            request_shape,
            extra_headers,
        }
    }

    /// Same profile pointed at another endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Chat message in provider-neutral form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self::new(turn.role.as_str(), turn.content.clone())
    }
}

/// One user question with everything needed to answer it.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub user_message: String,
    /// Formatted transcript of the page.
    pub context: String,
    pub session_id: String,
    /// Prior turns, oldest first.
    pub history: Vec<ChatMessage>,
    /// Page the question was asked from, sent as a referer where providers want one.
    pub page_url: Option<String>,
}

/// Normalized reply, whichever path produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    #[serde(rename = "responseText")]
    pub response_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Body sent to the backend relay's `/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct RelayChatRequest<'a> {
    pub user_message: &'a str,
    pub context: &'a str,
    pub session_id: &'a str,
    pub conversation_history: &'a [ChatMessage],
}

/// Body returned by the backend relay's `/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayChatResponse {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Credential/model change pushed by the settings surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    #[serde(rename = "apiKey")]
    pub credential: Option<String>,
    #[serde(rename = "modelName")]
    pub model_name: Option<String>,
}
