//! SubSync Core: conversation types, error taxonomy, configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DataPaths, SubSyncConfig, DEFAULT_CONTEXT_WINDOW};
pub use error::{Error, Result};
pub use types::{Role, Turn};
