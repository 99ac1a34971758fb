//! Pluggable extraction strategies.

pub mod heuristic;
pub mod structured;

use scraper::Html;
use subsync_core::Turn;

pub use heuristic::HeuristicStrategy;
pub use structured::StructuredStrategy;

/// Converts a parsed page into ordered turns. Never fails: a page with nothing
/// recognisable yields an empty list.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Html) -> Vec<Turn>;
}
