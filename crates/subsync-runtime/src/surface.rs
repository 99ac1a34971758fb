//! The interaction surface: one open chat panel over one page.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use subsync_chat::{ChatMessage, ChatOrchestrator, ChatRequest};
use subsync_core::{Error, Result, Role, Turn};
use subsync_extract::{Platform, TranscriptExtractor, NO_CONVERSATION};
use subsync_store::SessionStore;

use crate::source::PageSource;
use crate::types::{failure_message, SubmitOutcome};

/// Clears the in-flight flag when a submission finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct InteractionSurface {
    orchestrator: Arc<ChatOrchestrator>,
    sessions: Mutex<SessionStore>,
    source: Box<dyn PageSource>,
    extractor: TranscriptExtractor,
    context_window: usize,
    busy: AtomicBool,
}

impl InteractionSurface {
    pub fn new(
        orchestrator: Arc<ChatOrchestrator>,
        sessions: SessionStore,
        source: Box<dyn PageSource>,
        context_window: usize,
    ) -> Self {
        let extractor = TranscriptExtractor::for_host(source.host());
        Self {
            orchestrator,
            sessions: Mutex::new(sessions),
            source,
            extractor,
            context_window,
            busy: AtomicBool::new(false),
        }
    }

    pub fn platform(&self) -> Platform {
        self.extractor.platform()
    }

    /// Restore unexpired history and scrape the page into the context.
    /// Returns whether history was restored.
    pub fn open(&self) -> bool {
        let restored = self.sessions.lock().load();
        let context = self.refresh_context();
        info!(
            "Surface opened on {} (platform={}, restored={}, context={} chars)",
            self.source.host(),
            self.platform(),
            restored,
            context.len()
        );
        restored
    }

    /// Re-scrape the page and cache the formatted transcript. An unreadable
    /// page counts as empty.
    pub fn refresh_context(&self) -> String {
        let context = match self.read_page() {
            Some(html) => self.extractor.extract_html(&html),
            None => NO_CONVERSATION.to_string(),
        };
        self.sessions.lock().set_context(context.clone());
        context
    }

    fn read_page(&self) -> Option<String> {
        match self.source.snapshot() {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Failed to read page from {}: {}", self.source.host(), e);
                None
            }
        }
    }

    /// Text was selected on the page. Only notifies the relay; the
    /// transcript is not re-extracted.
    pub async fn on_selection(&self) -> Option<Value> {
        let session_id = self.session_id();
        self.orchestrator.sync_session(&session_id).await
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn session_id(&self) -> String {
        self.sessions.lock().session_id().to_string()
    }

    pub fn context(&self) -> String {
        self.sessions.lock().context().to_string()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.sessions.lock().turns().to_vec()
    }

    /// Ask a question about the page.
    ///
    /// Rejected with [`Error::Busy`] while another submission is in flight.
    /// Provider or relay failures do not error: a fixed notice is appended
    /// instead and returned as [`SubmitOutcome::Failed`].
    pub async fn submit(&self, message: &str) -> Result<SubmitOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Config("message is empty".into()));
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(Error::Busy);
        }
        let _in_flight = InFlight(&self.busy);

        let live_tail = match self.read_page() {
            Some(html) => self.extractor.last_turns_html(&html, self.context_window),
            None => Vec::new(),
        };

        let request = {
            let mut sessions = self.sessions.lock();
            sessions.add_turn(Role::User, message, None);

            let mut history: Vec<ChatMessage> = live_tail.iter().map(ChatMessage::from).collect();
            history.extend(sessions.history(true).iter().map(ChatMessage::from));
            debug!(
                "Submitting with {} live turns and {} session turns",
                live_tail.len(),
                history.len() - live_tail.len()
            );

            ChatRequest {
                user_message: message.to_string(),
                context: sessions.context().to_string(),
                session_id: sessions.session_id().to_string(),
                history,
                page_url: Some(self.page_url()),
            }
        };

        let result = self.orchestrator.send(&request).await;

        let mut sessions = self.sessions.lock();
        match result {
            Ok(reply) => {
                let turn = Turn::at(Role::Assistant, reply.response_text, reply.timestamp);
                sessions.add_turn(turn.role, turn.content.clone(), Some(turn.timestamp));
                if let Err(e) = sessions.persist() {
                    warn!("Failed to persist session {}: {}", sessions.session_id(), e);
                }
                Ok(SubmitOutcome::Answered(turn))
            }
            Err(error) => {
                warn!("Chat request failed: {}", error);
                let notice = Turn::new(
                    Role::Assistant,
                    failure_message(self.orchestrator.has_credential()),
                );
                sessions.add_turn(notice.role, notice.content.clone(), Some(notice.timestamp));
                Ok(SubmitOutcome::Failed { notice, error })
            }
        }
    }

    /// Persist the current session, start a fresh one and re-scrape the page.
    /// Returns the new session id, or [`Error::Busy`] while a request is in flight.
    pub fn reset(&self) -> Result<String> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        let session_id = {
            let mut sessions = self.sessions.lock();
            if !sessions.turns().is_empty() {
                if let Err(e) = sessions.persist() {
                    warn!("Failed to persist session {}: {}", sessions.session_id(), e);
                }
            }
            sessions.new_session().to_string()
        };
        self.refresh_context();
        Ok(session_id)
    }

    fn page_url(&self) -> String {
        let host = self.source.host();
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}
