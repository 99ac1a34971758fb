//! Small read-only queries over a parsed page.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Text that marks UI chrome rather than conversation content.
static CHROME_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Copy|Retry|New chat|Settings)").unwrap());

/// Narrower list used by the paragraph fallback, which keeps "Settings" text.
static FALLBACK_CHROME_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Copy|Retry|New chat)").unwrap());

static MAIN_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static ROLE_MAIN_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[role="main"]"#).unwrap());
static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Elements whose presence marks a container as chrome.
pub const INTERACTIVE_TAGS: &[&str] = &["button", "input", "textarea", "nav"];

/// The container the conversation lives in: `main`, then `[role=main]`, then `body`.
pub fn conversation_root(document: &Html) -> ElementRef<'_> {
    document
        .select(&MAIN_SEL)
        .next()
        .or_else(|| document.select(&ROLE_MAIN_SEL).next())
        .or_else(|| document.select(&BODY_SEL).next())
        .unwrap_or_else(|| document.root_element())
}

/// Concatenated descendant text, trimmed.
pub fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Length as the page would report it: characters, not bytes.
pub fn text_len(text: &str) -> usize {
    text.chars().count()
}

pub fn is_chrome_text(text: &str) -> bool {
    CHROME_TEXT.is_match(text)
}

pub fn is_fallback_chrome_text(text: &str) -> bool {
    FALLBACK_CHROME_TEXT.is_match(text)
}

/// Whether a text node directly under `element` carries more than `min_len` characters.
pub fn has_direct_text(element: ElementRef<'_>, min_len: usize) -> bool {
    element.children().any(|child| {
        child
            .value()
            .as_text()
            .is_some_and(|text| text_len(text.trim()) > min_len)
    })
}

/// `> p` or `> div > p`.
pub fn has_paragraph_children(element: ElementRef<'_>) -> bool {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .any(|child| match child.value().name() {
            "p" => true,
            "div" => child
                .children()
                .filter_map(ElementRef::wrap)
                .any(|grandchild| grandchild.value().name() == "p"),
            _ => false,
        })
}

/// Whether any strict descendant is one of `tags`.
pub fn contains_any_tag(element: ElementRef<'_>, tags: &[&str]) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|descendant| tags.contains(&descendant.value().name()))
}

/// Number of ancestors strictly between `element` and `root`.
pub fn depth_below(element: ElementRef<'_>, root: ElementRef<'_>) -> usize {
    element
        .ancestors()
        .take_while(|ancestor| ancestor.id() != root.id())
        .count()
}

/// Whether `outer` is `inner` or one of its ancestors.
pub fn contains(outer: ElementRef<'_>, inner: ElementRef<'_>) -> bool {
    outer.id() == inner.id() || inner.ancestors().any(|ancestor| ancestor.id() == outer.id())
}
