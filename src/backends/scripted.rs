//! Scripted backend — canned replies for tests and keyless local runs.
//! Selected with `mode = "scripted"` in `[backends]`; no network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{AnswerResult, BackendError, BackendKind, Citation};

/// Deterministic adapter stand-in.
///
/// Clones share the call counter and the recorded token, so a test can keep
/// one handle and hand a clone to the orchestrator.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    reply_text: String,
    citations: Vec<Citation>,
    conversation_token: Option<String>,
    fail: bool,
    calls: Arc<AtomicUsize>,
    last_token_in: Arc<Mutex<Option<String>>>,
}

impl ScriptedBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply_text: reply.into(),
            citations: Vec::new(),
            conversation_token: None,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            last_token_in: Arc::new(Mutex::new(None)),
        }
    }

    /// A backend that fails every call — exercises the fail-soft path.
    pub fn failing() -> Self {
        let mut b = Self::new("");
        b.fail = true;
        b
    }

    /// Attach a continuation token to every successful reply.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.conversation_token = Some(token.into());
        self
    }

    /// Attach citations to every successful reply.
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// How many times `reply` ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The conversation token passed into the most recent call.
    pub fn last_token_in(&self) -> Option<String> {
        self.last_token_in
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn reply(
        &self,
        kind: BackendKind,
        _question: &str,
        conversation_token: Option<&str>,
    ) -> Result<AnswerResult, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_token_in.lock().unwrap_or_else(|e| e.into_inner()) =
            conversation_token.map(String::from);

        if self.fail {
            return Err(BackendError::Transport("scripted failure".to_string()));
        }

        Ok(AnswerResult {
            source: kind,
            text: self.reply_text.clone(),
            citations: self.citations.clone(),
            conversation_token: self.conversation_token.clone(),
        })
    }
}
