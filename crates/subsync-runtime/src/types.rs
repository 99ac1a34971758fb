//! Runtime types.

use subsync_core::{Error, Turn};

/// Shown when a direct provider call fails.
pub const API_FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error with the API. Please check your API key and model settings.";

/// Shown when the relay path fails.
pub const RELAY_FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error. Please make sure the backend is running and try again.";

/// Pick the user-visible failure message for the active dispatch path.
pub fn failure_message(has_credential: bool) -> &'static str {
    if has_credential {
        API_FAILURE_MESSAGE
    } else {
        RELAY_FAILURE_MESSAGE
    }
}

/// What a submission produced. Either way an assistant turn was appended.
#[derive(Debug)]
pub enum SubmitOutcome {
    Answered(Turn),
    Failed { notice: Turn, error: Error },
}

impl SubmitOutcome {
    /// The assistant turn appended to the session.
    pub fn turn(&self) -> &Turn {
        match self {
            Self::Answered(turn) => turn,
            Self::Failed { notice, .. } => notice,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}
