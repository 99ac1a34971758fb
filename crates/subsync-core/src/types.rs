//! Conversation turns shared by extraction, session storage and chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Map a platform role label. Anything that is not `user` is treated as
    /// the assistant side.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Assistant
        }
    }

    /// Alternating attribution: even positions are the user.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Self::User
        } else {
            Self::Assistant
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attributed unit of conversation content.
///
/// Turns are never edited after creation; collections of turns only grow by
/// appending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self::at(role, content, Utc::now())
    }

    pub fn at(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_label() {
        assert_eq!(Role::from_label("user"), Role::User);
        assert_eq!(Role::from_label(" User "), Role::User);
        assert_eq!(Role::from_label("assistant"), Role::Assistant);
        assert_eq!(Role::from_label("tool"), Role::Assistant);
    }

    #[test]
    fn test_role_parity() {
        assert_eq!(Role::for_index(0), Role::User);
        assert_eq!(Role::for_index(1), Role::Assistant);
        assert_eq!(Role::for_index(4), Role::User);
    }

    #[test]
    fn test_turn_serializes_lowercase_role() {
        let turn = Turn::new(Role::Assistant, "hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
        assert!(json["timestamp"].is_string());
    }
}
