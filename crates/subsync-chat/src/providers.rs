//! Provider detection, wire formats and the single-request call path.
//!
//! Three body layouts cover the five providers:
//! OpenAI, OpenRouter and MegaLLM take the flat `messages` list with a
//! `system` entry; Anthropic wants the system prompt as a top-level field;
//! Gemini has no system role at all, so it is folded into the first turn.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use subsync_core::{Error, Result};

use crate::types::{AuthScheme, ChatMessage, ProviderKind, ProviderProfile, RequestShape};

/// Response-token cap sent to providers that require one.
pub const ANTHROPIC_MAX_TOKENS: u32 = 1024;

/// Classify a credential by its literal prefix. Blank means no direct provider.
pub fn classify_provider(credential: &str) -> Option<ProviderKind> {
    let credential = credential.trim();
    if credential.is_empty() {
        return None;
    }
    let kind = if credential.starts_with("sk-ant-") {
        ProviderKind::Anthropic
    } else if credential.starts_with("sk-or-") {
        ProviderKind::OpenRouter
    } else if credential.starts_with("sk-") {
        ProviderKind::OpenAI
    } else if credential.starts_with("AIza") {
        ProviderKind::Gemini
    } else {
        ProviderKind::MegaLLM
    };
    Some(kind)
}

/// System prompt followed by history and the new question.
pub fn build_messages(context: &str, history: &[ChatMessage], user_message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new(
        "system",
        format!(
            "You are a helpful assistant. The user is asking a question about this conversation context:\n\n{}\n\nAnswer their questions based on this context.",
            context
        ),
    ));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::new("user", user_message));
    messages
}

/// A fully formatted HTTP request, ready to send.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: String,
    /// Query parameters, encoded when the request is built.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

/// Format `messages` the way `profile`'s API expects.
pub fn format_request(
    profile: &ProviderProfile,
    messages: &[ChatMessage],
    model: &str,
    credential: &str,
    referer: Option<&str>,
) -> PreparedRequest {
    let mut url = profile.endpoint.clone();
    let mut query = Vec::new();
    let mut headers: Vec<(String, String)> =
        vec![("Content-Type".into(), "application/json".into())];

    match profile.auth_scheme {
        AuthScheme::Bearer => {
            headers.push(("Authorization".into(), format!("Bearer {}", credential)));
        }
        AuthScheme::ApiKeyHeader => {
            headers.push(("x-api-key".into(), credential.to_string()));
        }
        AuthScheme::QueryKey => {
            query.push(("key".to_string(), credential.to_string()));
        }
    }
    headers.extend(profile.extra_headers.iter().cloned());
    if profile.kind == ProviderKind::OpenRouter {
        if let Some(referer) = referer {
            headers.push(("HTTP-Referer".into(), referer.to_string()));
        }
    }

    let body = match profile.request_shape {
        RequestShape::FlatWithSystem => flat_body(messages, model),
        RequestShape::SeparateSystem => separate_system_body(messages, model),
        RequestShape::MergedParts => {
            url = format!(
                "{}/{}:generateContent",
                profile.endpoint.trim_end_matches('/'),
                model
            );
            merged_parts_body(messages)
        }
    };

    PreparedRequest {
        url,
        query,
        headers,
        body,
    }
}

fn flat_body(messages: &[ChatMessage], model: &str) -> Value {
    let msgs: Vec<Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": msgs,
    })
}

fn system_text(messages: &[ChatMessage]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn separate_system_body(messages: &[ChatMessage], model: &str) -> Value {
    let conv_msgs: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "max_tokens": ANTHROPIC_MAX_TOKENS,
        "messages": conv_msgs,
    });
    if let Some(system) = system_text(messages) {
        body["system"] = json!(system);
    }
    body
}

fn merged_parts_body(messages: &[ChatMessage]) -> Value {
    let mut system = system_text(messages);
    let mut contents: Vec<Value> = Vec::new();

    for m in messages.iter().filter(|m| m.role != "system") {
        let text = match system.take() {
            Some(sys) => format!("{}\n\n{}", sys, m.content),
            None => m.content.clone(),
        };
        let role = if m.role == "assistant" { "model" } else { "user" };
        contents.push(json!({"role": role, "parts": [{"text": text}]}));
    }

    // Nothing but a system prompt: send it as the only user turn.
    if let Some(sys) = system {
        contents.push(json!({"role": "user", "parts": [{"text": sys}]}));
    }

    json!({ "contents": contents })
}

/// Pull the reply text out of a provider response.
pub fn extract_reply(shape: RequestShape, response: &Value) -> Option<String> {
    match shape {
        RequestShape::FlatWithSystem => response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string),
        RequestShape::SeparateSystem => join_text(&response["content"]),
        RequestShape::MergedParts => join_text(&response["candidates"][0]["content"]["parts"]),
    }
}

fn join_text(blocks: &Value) -> Option<String> {
    let texts: Vec<&str> = blocks
        .as_array()?
        .iter()
        .filter_map(|block| block["text"].as_str())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

/// Send one prepared request and return the reply text.
pub async fn call_provider(
    client: &Client,
    profile: &ProviderProfile,
    request: PreparedRequest,
    timeout: Option<Duration>,
) -> Result<String> {
    let provider = profile.kind.label().to_string();
    debug!("Calling {} at {}", provider, profile.endpoint);

    let mut builder = client.post(&request.url);
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder = builder.json(&request.body);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder.send().await.map_err(|e| Error::ProviderTransport {
        provider: provider.clone(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::ProviderHttp {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    let value: Value = response.json().await.map_err(|e| Error::MalformedResponse {
        provider: provider.clone(),
        message: e.to_string(),
    })?;

    extract_reply(profile.request_shape, &value).ok_or_else(|| Error::MalformedResponse {
        provider,
        message: "reply text missing".into(),
    })
}
