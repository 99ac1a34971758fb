//! Error types for SubSync.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Provider answered with a non-success status.
    #[error("{provider} API error: {status} - {body}")]
    ProviderHttp {
        provider: String,
        status: u16,
        body: String,
    },

    /// Request never produced a response (connect, DNS, timeout).
    #[error("{provider} request failed: {message}")]
    ProviderTransport { provider: String, message: String },

    /// Provider answered 2xx but the reply field was missing.
    #[error("{provider} returned an unexpected response: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("All API providers failed: {last_reason}")]
    AllProvidersFailed { last_reason: String },

    #[error("Backend relay error: {0}")]
    Relay(String),

    #[error("A chat request is already in flight for this session")]
    Busy,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a failover chain may move on to the next provider.
    pub fn is_failover_eligible(&self) -> bool {
        matches!(
            self,
            Self::ProviderHttp { .. }
                | Self::ProviderTransport { .. }
                | Self::MalformedResponse { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
