//! In-process HTTP server standing in for providers and the relay.
//!
//! Every path is answered by one fallback handler: the reply shape is picked
//! from the path, and each request is recorded for later assertions.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl Hit {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Default)]
struct MockState {
    hits: Mutex<Vec<Hit>>,
    failures: Mutex<HashMap<String, u16>>,
}

pub struct MockServer {
    base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    /// Answer `path` with `status` from now on.
    pub fn fail(&self, path: &str, status: u16) {
        self.state.failures.lock().insert(path.to_string(), status);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().iter().filter(|h| h.path == path).count()
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().len()
    }

    pub fn last_hit(&self, path: &str) -> Option<Hit> {
        self.state
            .hits
            .lock()
            .iter()
            .rev()
            .find(|h| h.path == path)
            .cloned()
    }
}

/// Client that never routes loopback traffic through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// URL of a port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let hit = Hit {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state.hits.lock().push(hit);

    if let Some(status) = state.failures.lock().get(&path).copied() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, format!("mock failure at {}", path)).into_response();
    }

    let reply = if path == "/chat" {
        json!({"response": "relay says hi", "timestamp": "2024-05-01T12:00:00Z"})
    } else if path == "/sync" {
        json!({"ok": true})
    } else if path == "/health" {
        json!({"status": "ok"})
    } else if path.ends_with(":generateContent") {
        json!({"candidates": [{"content": {"parts": [{"text": format!("reply from {}", path)}]}}]})
    } else if path.starts_with("/anthropic") {
        json!({"content": [{"type": "text", "text": format!("reply from {}", path)}]})
    } else if path.starts_with("/malformed") {
        json!({"unexpected": true})
    } else {
        json!({"choices": [{"message": {"role": "assistant", "content": format!("reply from {}", path)}}]})
    };
    Json(reply).into_response()
}
