//! Heuristic extraction for pages without per-message role tags.
//!
//! No element on such a page reliably marks "one message", so turn
//! boundaries are inferred:
//!
//! 1. every `div` under the conversation root that carries prose, has more
//!    than 30 characters, holds no interactive controls and does not start
//!    with a chrome phrase becomes a candidate;
//! 2. candidates are ranked by depth below the root, shallowest first, since
//!    the outermost qualifying wrapper is usually the real message container;
//! 3. a candidate is dropped when an already kept one contains it or carries
//!    the identical text;
//! 4. roles alternate over the kept list, user first.
//!
//! Step 4 misattributes whenever the real conversation is not strictly
//! alternating (two user messages in a row, a banner picked up as content).
//! That limitation is accepted as-is.
//!
//! When nothing survives, a looser pass reads `p` and `div[class*=whitespace]`
//! blocks and only removes exact repeats. Its chrome filter is shorter: text
//! starting with "Settings" is kept there.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use subsync_core::{Role, Turn};
use tracing::debug;

use super::ExtractionStrategy;
use crate::dom;

/// Minimum characters in a direct text run for a container to count as prose.
const MIN_DIRECT_TEXT: usize = 20;
/// Minimum characters of total text for any candidate or fallback block.
const MIN_TURN_TEXT: usize = 30;

static FALLBACK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"p, div[class*="whitespace"]"#).unwrap());

/// A container provisionally considered to be one turn.
#[derive(Debug, Clone)]
pub struct ExtractionCandidate<'a> {
    pub text: String,
    pub depth: usize,
    pub element: ElementRef<'a>,
}

/// Depth-ranked containment scan with a paragraph fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicStrategy;

impl ExtractionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn extract(&self, document: &Html) -> Vec<Turn> {
        let root = dom::conversation_root(document);
        let kept = dedup_by_containment(collect_candidates(root));

        if kept.is_empty() {
            let turns = fallback_turns(root);
            debug!("Heuristic extraction fell back to paragraphs: {} turns", turns.len());
            return turns;
        }

        debug!("Heuristic extraction: {} turns", kept.len());
        kept.into_iter()
            .enumerate()
            .map(|(index, candidate)| Turn::new(Role::for_index(index), candidate.text))
            .collect()
    }
}

/// Qualifying containers below `root`, sorted by ascending depth. The sort is
/// stable, so equal depths keep document order.
pub fn collect_candidates(root: ElementRef<'_>) -> Vec<ExtractionCandidate<'_>> {
    let mut candidates: Vec<ExtractionCandidate<'_>> = root
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
        .filter_map(|el| {
            let carries_prose =
                dom::has_direct_text(el, MIN_DIRECT_TEXT) || dom::has_paragraph_children(el);
            if !carries_prose {
                return None;
            }
            let text = dom::text_content(el);
            if dom::text_len(&text) <= MIN_TURN_TEXT
                || dom::contains_any_tag(el, dom::INTERACTIVE_TAGS)
                || dom::is_chrome_text(&text)
            {
                return None;
            }
            Some(ExtractionCandidate {
                depth: dom::depth_below(el, root),
                text,
                element: el,
            })
        })
        .collect();

    candidates.sort_by_key(|c| c.depth);
    candidates
}

/// Keep a candidate unless an already kept one contains it or has the same text.
pub fn dedup_by_containment(candidates: Vec<ExtractionCandidate<'_>>) -> Vec<ExtractionCandidate<'_>> {
    let mut kept: Vec<ExtractionCandidate<'_>> = Vec::new();
    for candidate in candidates {
        let duplicate = kept.iter().any(|existing| {
            dom::contains(existing.element, candidate.element)
                || (existing.text == candidate.text && existing.element.id() != candidate.element.id())
        });
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

/// Paragraph-level pass. Roles follow the block's position among all
/// qualifying blocks, repeats included.
fn fallback_turns(root: ElementRef<'_>) -> Vec<Turn> {
    let blocks: Vec<String> = root
        .select(&FALLBACK_SEL)
        .map(dom::text_content)
        .filter(|text| dom::text_len(text) > MIN_TURN_TEXT && !dom::is_fallback_chrome_text(text))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    blocks
        .iter()
        .enumerate()
        .filter(|(_, text)| seen.insert(text.as_str()))
        .map(|(index, text)| Turn::new(Role::for_index(index), text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<Turn> {
        HeuristicStrategy.extract(&Html::parse_document(html))
    }

    #[test]
    fn test_nested_text_run_emits_one_turn() {
        let html = r#"<main><div>Hello world, this is long enough<div>Hello world, this is long enough</div></div></main>"#;
        let doc = Html::parse_document(html);
        let candidates = collect_candidates(dom::conversation_root(&doc));
        assert_eq!(candidates.len(), 2);

        let turns = extract(html);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        assert!(turns[0].content.starts_with("Hello world"));
    }

    #[test]
    fn test_outer_wrapper_wins_over_inner_candidate() {
        let html = r#"<main>
            <div id="outer"><div id="inner"><p>Hello world, this is long enough</p></div></div>
        </main>"#;
        let doc = Html::parse_document(html);
        let root = dom::conversation_root(&doc);
        let candidates = collect_candidates(root);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].element.value().id(), Some("outer"));
        assert_eq!(candidates[0].depth, 0);
        assert_eq!(candidates[1].depth, 1);

        let kept = dedup_by_containment(candidates);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].element.value().id(), Some("outer"));
        assert_eq!(kept[0].text, "Hello world, this is long enough");
    }

    #[test]
    fn test_roles_alternate_over_kept_turns() {
        let html = r#"<main>
            <div><p>How do I reverse a vector in Rust quickly?</p></div>
            <div><p>Call the reverse method on a mutable vector.</p></div>
            <div><p>And what about an iterator, can it be reversed?</p></div>
        </main>"#;
        let turns = extract(html);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[2].role, Role::User);
        assert!(turns[1].content.starts_with("Call the reverse"));
    }

    #[test]
    fn test_chrome_containers_are_rejected() {
        let html = r#"<main>
            <div><p>This block has a control inside it, so it is chrome.</p><button>Go</button></div>
            <div><p>Settings for the workspace are described over here.</p></div>
            <div><nav><p>Navigation links that are long enough to count.</p></nav></div>
            <div><p>Genuine message content that should be extracted.</p></div>
        </main>"#;
        let turns = extract(html);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "Genuine message content that should be extracted.");
    }

    #[test]
    fn test_kept_candidates_are_depth_ordered_and_disjoint() {
        let html = r#"<main>
            <section><div id="deep"><p>A deeper message sitting inside a section wrapper.</p></div></section>
            <div id="shallow"><p>A shallow message placed directly below the root.</p>
                <div><p>Nested paragraph that belongs to the shallow message.</p></div>
            </div>
        </main>"#;
        let doc = Html::parse_document(html);
        let root = dom::conversation_root(&doc);
        let kept = dedup_by_containment(collect_candidates(root));

        assert!(kept.windows(2).all(|w| w[0].depth <= w[1].depth));
        for (i, a) in kept.iter().enumerate() {
            for (j, b) in kept.iter().enumerate() {
                if i != j {
                    assert!(!dom::contains(a.element, b.element));
                }
            }
        }
        assert_eq!(kept[0].element.value().id(), Some("shallow"));
        assert_eq!(kept[1].element.value().id(), Some("deep"));
    }

    #[test]
    fn test_fallback_reads_paragraphs_when_no_container_qualifies() {
        // Every div holds a button, so only the paragraph pass can find text.
        let html = r#"<main><div><button>x</button>
            <p>First paragraph that is comfortably over thirty chars.</p>
            <p>First paragraph that is comfortably over thirty chars.</p>
            <p>Second paragraph, also long enough to be picked up.</p>
            <p>short</p>
        </div></main>"#;
        let turns = extract(html);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        // Index counts the repeated block, so the next distinct one lands on an even slot.
        assert_eq!(turns[1].role, Role::User);
        assert!(turns[1].content.starts_with("Second paragraph"));
    }

    #[test]
    fn test_fallback_keeps_settings_text() {
        let html = r#"<main><div><button>x</button>
            <p>Settings were changed to dark mode before the chat began.</p>
            <p>Copy this whole answer into the release notes, please.</p>
        </div></main>"#;
        let turns = extract(html);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].content.starts_with("Settings were changed"));
    }

    #[test]
    fn test_empty_page_yields_no_turns() {
        assert!(extract("<html><body></body></html>").is_empty());
        assert!(extract("<main><div>too short</div></main>").is_empty());
    }
}
