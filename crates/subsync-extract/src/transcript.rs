//! Transcript extraction entry points and context formatting.

use scraper::Html;
use subsync_core::Turn;
use tracing::debug;

use crate::platform::Platform;

/// Rendered in place of a transcript when nothing could be extracted.
pub const NO_CONVERSATION: &str = "No conversation found.";

/// Extracts the transcript of one page for a fixed platform.
pub struct TranscriptExtractor {
    platform: Platform,
}

impl TranscriptExtractor {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Classify `host_identifier` and build the matching extractor.
    pub fn for_host(host_identifier: &str) -> Self {
        Self::new(Platform::classify(host_identifier))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// All turns on the page, in extraction order.
    pub fn extract_turns(&self, document: &Html) -> Vec<Turn> {
        match self.platform.strategy() {
            Some(strategy) => strategy.extract(document),
            None => {
                debug!("No extraction strategy for platform {}", self.platform);
                Vec::new()
            }
        }
    }

    /// The page transcript formatted as conversation context, or
    /// [`NO_CONVERSATION`] when empty.
    pub fn extract(&self, document: &Html) -> String {
        format_turns(&self.extract_turns(document))
    }

    /// The last `n` turns, in their original order.
    pub fn last_turns(&self, document: &Html, n: usize) -> Vec<Turn> {
        let mut turns = self.extract_turns(document);
        let start = turns.len().saturating_sub(n);
        turns.split_off(start)
    }

    /// Parse raw HTML and extract. The parsed tree never outlives the call.
    pub fn extract_html(&self, html: &str) -> String {
        self.extract(&Html::parse_document(html))
    }

    pub fn last_turns_html(&self, html: &str, n: usize) -> Vec<Turn> {
        self.last_turns(&Html::parse_document(html), n)
    }
}

/// `ROLE: content` per turn, each followed by a blank line.
pub fn format_turns(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return NO_CONVERSATION.to_string();
    }
    turns
        .iter()
        .map(|turn| format!("{}: {}\n\n", turn.role.as_str().to_uppercase(), turn.content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use subsync_core::Role;

    fn claude_page(messages: usize) -> String {
        let body: String = (0..messages)
            .map(|i| format!("<div><p>Message number {i:02} with enough text to qualify.</p></div>"))
            .collect();
        format!("<html><body><main>{body}</main></body></html>")
    }

    fn chatgpt_page(messages: usize) -> String {
        let body: String = (0..messages)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "assistant" };
                format!(
                    r#"<div data-message-author-role="{role}"><div class="markdown">Reply {i}</div></div>"#
                )
            })
            .collect();
        format!("<main>{body}</main>")
    }

    #[test]
    fn test_empty_page_renders_sentinel() {
        let extractor = TranscriptExtractor::new(Platform::Claude);
        assert_eq!(extractor.extract_html("<html><body></body></html>"), NO_CONVERSATION);
    }

    #[test]
    fn test_unknown_platform_renders_sentinel() {
        let extractor = TranscriptExtractor::for_host("example.org");
        assert_eq!(extractor.platform(), Platform::Unknown);
        assert_eq!(extractor.extract_html(&chatgpt_page(4)), NO_CONVERSATION);
    }

    #[test]
    fn test_format_turns() {
        let turns = vec![
            Turn::new(Role::User, "Hi there"),
            Turn::new(Role::Assistant, "Hello!"),
        ];
        assert_eq!(format_turns(&turns), "USER: Hi there\n\nASSISTANT: Hello!\n\n");
    }

    #[test]
    fn test_last_turns_takes_tail_in_order() {
        let extractor = TranscriptExtractor::new(Platform::Claude);
        let page = claude_page(10);

        let tail = extractor.last_turns_html(&page, 3);
        assert_eq!(tail.len(), 3);
        assert!(tail[0].content.starts_with("Message number 07"));
        assert!(tail[1].content.starts_with("Message number 08"));
        assert!(tail[2].content.starts_with("Message number 09"));
        // Roles come from the full pass, not from the trimmed window.
        assert_eq!(tail[0].role, Role::Assistant);
        assert_eq!(tail[1].role, Role::User);
    }

    #[test]
    fn test_last_turns_short_transcript() {
        let extractor = TranscriptExtractor::new(Platform::ChatGPT);
        let tail = extractor.last_turns_html(&chatgpt_page(2), 3);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "Reply 0");
        assert_eq!(tail[1].content, "Reply 1");
    }

    #[test]
    fn test_extraction_never_repeats_text() {
        let page = r#"<main>
            <div><p>Duplicated message text that is long enough here.</p></div>
            <div><p>Duplicated message text that is long enough here.</p></div>
            <div><p>Another message text that is long enough as well.</p></div>
        </main>"#;
        for platform in [Platform::Claude, Platform::ChatGPT] {
            let turns = TranscriptExtractor::new(platform).extract_turns(&Html::parse_document(page));
            let unique: HashSet<&str> = turns.iter().map(|t| t.content.as_str()).collect();
            assert_eq!(unique.len(), turns.len());
        }
        let turns = TranscriptExtractor::new(Platform::Claude)
            .extract_turns(&Html::parse_document(page));
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn test_full_chatgpt_transcript() {
        let extractor = TranscriptExtractor::for_host("https://chatgpt.com/c/1");
        let text = extractor.extract_html(&chatgpt_page(2));
        assert_eq!(text, "USER: Reply 0\n\nASSISTANT: Reply 1\n\n");
    }
}
