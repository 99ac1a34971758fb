//! SubSync runtime: the interaction surface a user talks to.
//!
//! Opening a surface scrapes the page transcript into the session context and
//! restores unexpired history. Each submission sends the live transcript tail
//! plus the session history to the orchestrator, then records the reply.

pub mod context;
pub mod source;
pub mod surface;
pub mod types;

pub use context::RuntimeContext;
pub use source::{FilePage, PageSource, StaticPage};
pub use surface::InteractionSurface;
pub use types::*;
