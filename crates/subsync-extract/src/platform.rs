//! Hosting platform classification.

use serde::{Deserialize, Serialize};

use crate::strategy::{ExtractionStrategy, HeuristicStrategy, StructuredStrategy};

/// Chat products whose pages we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "chatgpt")]
    ChatGPT,
    Claude,
    Unknown,
}

impl Platform {
    /// Classify a hostname or page URL. Scheme, port and path are ignored.
    pub fn classify(host_identifier: &str) -> Self {
        let host = host_of(host_identifier).to_ascii_lowercase();
        if host.contains("chatgpt.com") || host.contains("chat.openai.com") {
            Self::ChatGPT
        } else if host.contains("claude.ai") {
            Self::Claude
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChatGPT => "chatgpt",
            Self::Claude => "claude",
            Self::Unknown => "unknown",
        }
    }

    /// Extraction strategy for this platform. `Unknown` has none.
    pub fn strategy(&self) -> Option<Box<dyn ExtractionStrategy>> {
        match self {
            Self::ChatGPT => Some(Box::new(StructuredStrategy)),
            Self::Claude => Some(Box::new(HeuristicStrategy)),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn host_of(identifier: &str) -> &str {
    let rest = identifier
        .trim()
        .split_once("://")
        .map_or(identifier.trim(), |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host)
        .split(':')
        .next()
        .unwrap_or(authority)
}
