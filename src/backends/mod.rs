//! Backend adapters — uniform calls into the two external answering services.
//!
//! Each backend is an enum over concrete adapter implementations. Adding a
//! variant + module is how a new service flavor is wired in; enum dispatch
//! avoids `dyn` trait objects and the `async-trait` dependency.
//!
//! Adapters are the only place that knows a service's wire shape. They
//! normalise every reply into [`AnswerResult`] and **fail soft**: a
//! transport or service error is logged and converted into an answer whose
//! text is a fixed user-safe message. Raw error detail never leaves this
//! module upward.

pub mod scripted;
pub mod semantic;
pub mod structured;

use serde::Serialize;
use thiserror::Error;
use tracing::error;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Adapter-internal failure. Consumed inside this module — callers of
/// [`SemanticBackend::ask`] / [`StructuredBackend::ask`] never see it.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unusable response: {0}")]
    Response(String),
}

// ── Answer model ──────────────────────────────────────────────────────────────

/// Which external service produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Structured business-data assistant.
    Structured,
    /// Semantic search over the document index.
    Semantic,
}

impl BackendKind {
    /// Section label used when answers from both backends are merged.
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Structured => "Business Data Analysis",
            BackendKind::Semantic => "Knowledge Base Insights",
        }
    }
}

/// One supporting source behind part of an answer. Order matters — most
/// relevant first; only the first few are surfaced (config `citation_limit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Backend-agnostic answer — produced by exactly one adapter call and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    pub source: BackendKind,
    pub text: String,
    pub citations: Vec<Citation>,
    /// Opaque handle for resuming the structured backend's multi-turn
    /// context. Internal — never serialised toward the UI.
    #[serde(skip)]
    pub conversation_token: Option<String>,
}

/// Fixed user-safe answer for a failed adapter call. Never includes the
/// underlying error text.
fn unavailable_answer(kind: BackendKind) -> AnswerResult {
    let text = match kind {
        BackendKind::Structured => {
            "The business-data assistant could not be reached. Please try again in a moment."
        }
        BackendKind::Semantic => {
            "The document search service could not be reached. Please try again in a moment."
        }
    };
    AnswerResult {
        source: kind,
        text: text.to_string(),
        citations: Vec::new(),
        conversation_token: None,
    }
}

// ── Semantic backend ──────────────────────────────────────────────────────────

/// Semantic-search adapter. Stateless per call — it never receives a
/// conversation token, by signature.
pub enum SemanticBackend {
    Http(semantic::SemanticHttpBackend),
    Scripted(scripted::ScriptedBackend),
}

impl SemanticBackend {
    /// Query the document index. Always returns an answer; failures come
    /// back as a safe error-text [`AnswerResult`].
    pub async fn ask(&self, question: &str) -> AnswerResult {
        let result = match self {
            SemanticBackend::Http(b) => b.query(question).await,
            SemanticBackend::Scripted(b) => b.reply(BackendKind::Semantic, question, None),
        };
        result.unwrap_or_else(|e| {
            error!(backend = "semantic", error = %e, "backend call failed");
            unavailable_answer(BackendKind::Semantic)
        })
    }
}

// ── Structured backend ────────────────────────────────────────────────────────

/// Structured-query adapter. Accepts the session's continuation token so the
/// service can resume its multi-turn context.
pub enum StructuredBackend {
    Http(structured::StructuredHttpBackend),
    Scripted(scripted::ScriptedBackend),
}

impl StructuredBackend {
    /// Ask the business-data assistant. Always returns an answer; failures
    /// come back as a safe error-text [`AnswerResult`].
    pub async fn ask(&self, question: &str, conversation_token: Option<&str>) -> AnswerResult {
        let result = match self {
            StructuredBackend::Http(b) => b.chat(question, conversation_token).await,
            StructuredBackend::Scripted(b) => {
                b.reply(BackendKind::Structured, question, conversation_token)
            }
        };
        result.unwrap_or_else(|e| {
            error!(backend = "structured", error = %e, "backend call failed");
            unavailable_answer(BackendKind::Structured)
        })
    }
}

// ── Shared HTTP plumbing ──────────────────────────────────────────────────────

/// Error envelope some services wrap failures in.
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: String,
}

/// Consume the response and return it if successful, or a structured error.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        format!("HTTP {status}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "backend returned HTTP error");
    Err(BackendError::Transport(message))
}
