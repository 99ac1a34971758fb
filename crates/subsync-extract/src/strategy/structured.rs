//! Exact extraction for pages that tag every message with its author role.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use subsync_core::{Role, Turn};
use tracing::debug;

use super::ExtractionStrategy;
use crate::dom::text_content;

static MESSAGE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-message-author-role]").unwrap());
static CONTENT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".markdown, .whitespace-pre-wrap").unwrap());

const ROLE_ATTR: &str = "data-message-author-role";

/// Reads `[data-message-author-role]` elements in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredStrategy;

impl ExtractionStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, document: &Html) -> Vec<Turn> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut turns = Vec::new();

        for element in document.select(&MESSAGE_SEL) {
            let role = Role::from_label(element.value().attr(ROLE_ATTR).unwrap_or_default());
            let Some(content_el) = element.select(&CONTENT_SEL).next() else {
                continue;
            };
            let content = text_content(content_el);
            if content.is_empty() || !seen.insert(content.clone()) {
                continue;
            }
            turns.push(Turn::new(role, content));
        }

        debug!("Structured extraction: {} turns", turns.len());
        turns
    }
}
