//! Where the rendered page comes from.
//!
//! The page is read again on every scrape so the transcript tail reflects
//! whatever the chat product has rendered since the surface opened.

use std::path::PathBuf;

use subsync_core::Result;

/// A live rendered page.
pub trait PageSource: Send + Sync {
    /// Host name or URL the page was served from.
    fn host(&self) -> &str;

    /// Current HTML of the page.
    fn snapshot(&self) -> Result<String>;
}

/// Fixed HTML, for tests and one-shot use.
pub struct StaticPage {
    host: String,
    html: String,
}

impl StaticPage {
    pub fn new(host: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            html: html.into(),
        }
    }
}

impl PageSource for StaticPage {
    fn host(&self) -> &str {
        &self.host
    }

    fn snapshot(&self) -> Result<String> {
        Ok(self.html.clone())
    }
}

/// An HTML file on disk, re-read on each snapshot.
pub struct FilePage {
    host: String,
    path: PathBuf,
}

impl FilePage {
    pub fn new(host: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }
}

impl PageSource for FilePage {
    fn host(&self) -> &str {
        &self.host
    }

    fn snapshot(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_page_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>one</p>").unwrap();
        let page = FilePage::new("claude.ai", &path);
        assert_eq!(page.snapshot().unwrap(), "<p>one</p>");

        std::fs::write(&path, "<p>two</p>").unwrap();
        assert_eq!(page.snapshot().unwrap(), "<p>two</p>");
        assert_eq!(page.host(), "claude.ai");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let page = FilePage::new("claude.ai", "/nonexistent/page.html");
        assert!(matches!(page.snapshot(), Err(subsync_core::Error::Io(_))));
    }
}
