//! Transcript extraction: turns a rendered chat page into ordered speaker turns.
//!
//! The hosting platform decides the strategy: pages that tag every message
//! with its author role are read exactly, everything else goes through the
//! depth-ranked heuristic scan.

pub mod dom;
pub mod platform;
pub mod strategy;
pub mod transcript;

pub use platform::Platform;
pub use strategy::{ExtractionStrategy, HeuristicStrategy, StructuredStrategy};
pub use transcript::{format_turns, TranscriptExtractor, NO_CONVERSATION};
