//! Orchestrator — one question in, one merged answer out.
//!
//! Composes the pipeline: validate → classify → cache-wrapped backend
//! fetch(es) → optional table extraction → merge. Owns no ambient state;
//! the process-wide cache is injected at construction and the per-session
//! conversation state is passed into every call.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::backends::{AnswerResult, BackendKind, Citation, SemanticBackend, StructuredBackend};
use crate::cache::ResponseCache;
use crate::config::LimitsConfig;
use crate::error::AppError;
use crate::routing::{Classifier, RouteDecision};
use crate::session::ConversationState;
use crate::tabular::{extract_table, TableView};

/// Verbs that mark a listing intent — only then is answer text scanned for
/// a table, so explanatory prose is never chopped up by a stray `|`.
const LISTING_VERBS: [&str; 3] = ["show", "list", "compare"];

// ── Result model ──────────────────────────────────────────────────────────────

/// One backend's contribution to a reply, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerSection {
    pub source: BackendKind,
    /// Display prose — the answer text minus any extracted table lines.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableView>,
    /// Already truncated to the configured citation limit.
    pub citations: Vec<Citation>,
}

/// The orchestrated reply: one section per consulted backend.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationResult {
    pub route: RouteDecision,
    /// Ordered structured-then-semantic when both backends were consulted.
    pub sections: Vec<AnswerSection>,
}

impl OrchestrationResult {
    /// Merged narrative with each section labeled by its backend.
    pub fn combined_markdown(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("**{}:**\n\n{}", s.source.label(), s.text))
            .collect::<Vec<String>>()
            .join("\n\n")
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct Orchestrator {
    classifier: Box<dyn Classifier>,
    semantic: SemanticBackend,
    structured: StructuredBackend,
    cache: Arc<ResponseCache>,
    max_question_chars: usize,
    citation_limit: usize,
    carry_conversation: bool,
}

impl Orchestrator {
    pub fn new(
        classifier: Box<dyn Classifier>,
        semantic: SemanticBackend,
        structured: StructuredBackend,
        cache: Arc<ResponseCache>,
        limits: &LimitsConfig,
        carry_conversation: bool,
    ) -> Self {
        Self {
            classifier,
            semantic,
            structured,
            cache,
            max_question_chars: limits.max_question_chars,
            citation_limit: limits.citation_limit,
            carry_conversation,
        }
    }

    /// Answer `question` within the given session context.
    ///
    /// Fails only on input validation — backend trouble degrades to safe
    /// error-text sections instead (see `backends`). When both backends are
    /// consulted, one failing never suppresses the other's section.
    pub async fn answer(
        &self,
        question: &str,
        state: &mut ConversationState,
    ) -> Result<OrchestrationResult, AppError> {
        validate(question, self.max_question_chars)?;

        let route = self.classifier.classify(question);
        debug!(?route, question_len = question.len(), "question routed");

        let token = if self.carry_conversation {
            state.structured_token.clone()
        } else {
            None
        };

        let answers = match route {
            RouteDecision::Structured => {
                vec![self.fetch_structured(question, token.as_deref()).await]
            }
            RouteDecision::Semantic => {
                vec![self.fetch_semantic(question).await]
            }
            RouteDecision::Both => {
                // Independent calls — issue concurrently, wait for both.
                let (structured, semantic) = tokio::join!(
                    self.fetch_structured(question, token.as_deref()),
                    self.fetch_semantic(question)
                );
                vec![structured, semantic]
            }
        };

        if self.carry_conversation {
            for answer in &answers {
                if answer.source == BackendKind::Structured {
                    if let Some(token) = &answer.conversation_token {
                        state.structured_token = Some(token.clone());
                    }
                }
            }
        }

        let extract = wants_table(question);
        let sections = answers
            .into_iter()
            .map(|a| self.build_section(a, extract))
            .collect();

        Ok(OrchestrationResult { route, sections })
    }

    async fn fetch_structured(&self, question: &str, token: Option<&str>) -> AnswerResult {
        self.cache
            .get_or_compute(BackendKind::Structured, question, || {
                self.structured.ask(question, token)
            })
            .await
    }

    async fn fetch_semantic(&self, question: &str) -> AnswerResult {
        self.cache
            .get_or_compute(BackendKind::Semantic, question, || self.semantic.ask(question))
            .await
    }

    fn build_section(&self, answer: AnswerResult, extract: bool) -> AnswerSection {
        let (table, text) = if extract {
            extract_table(&answer.text)
        } else {
            (None, answer.text)
        };

        AnswerSection {
            source: answer.source,
            text,
            table,
            citations: answer
                .citations
                .into_iter()
                .take(self.citation_limit)
                .collect(),
        }
    }
}

// ── Input validation ──────────────────────────────────────────────────────────

/// Reject unusable input before any backend is contacted. The empty question
/// is legal — it routes to both backends with zero scores.
fn validate(question: &str, max_chars: usize) -> Result<(), AppError> {
    if question.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "Question is too long (limit {max_chars} characters)."
        )));
    }
    if question
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(AppError::Validation(
            "Question contains unsupported control characters.".to_string(),
        ));
    }
    Ok(())
}

/// Listing intent: one of the listing verbs as the first word or anywhere
/// in the question as a whole word.
fn wants_table(question: &str) -> bool {
    let lowered = question.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| LISTING_VERBS.contains(&word))
}
