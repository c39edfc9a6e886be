//! Axum handlers for `/api/*` routes.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::AppError;
use super::ApiState;

/// Generous end-to-end budget — both backends plus merge.
const ASK_TIMEOUT: Duration = Duration::from_secs(120);

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct AskRequest {
    question: String,
    session_id: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /api/ask
pub(super) async fn ask(
    State(state): State<ApiState>,
    Json(req): Json<AskRequest>,
) -> Response {
    let (session_id, conversation) = state.sessions.resolve(req.session_id.as_deref()).await;

    // Per-session lock: one question at a time within a session, so the
    // continuation token has a single writer.
    let mut conversation = conversation.lock().await;

    let answered = tokio::time::timeout(
        ASK_TIMEOUT,
        state.orchestrator.answer(&req.question, &mut conversation),
    )
    .await;

    match answered {
        Ok(Ok(result)) => {
            let body = json!({
                "session_id": session_id,
                "route": result.route,
                "sections": result.sections,
                "combined": result.combined_markdown(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(Err(AppError::Validation(msg))) => {
            (StatusCode::BAD_REQUEST, json_error("invalid_question", msg)).into_response()
        }
        Ok(Err(e)) => {
            warn!(%session_id, "ask failed: {e}");
            (StatusCode::BAD_GATEWAY, json_error("internal", e)).into_response()
        }
        Err(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            json_error("timeout", "backend request timed out"),
        )
            .into_response(),
    }
}

/// GET /api/health
pub(super) async fn health(State(state): State<ApiState>) -> Response {
    let body = json!({
        "status": "ok",
        "bot": state.bot_name.as_ref(),
        "sessions": state.sessions.len().await,
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// GET /api/sessions
pub(super) async fn sessions(State(state): State<ApiState>) -> Response {
    let body = json!({ "sessions": state.sessions.ids().await });
    (StatusCode::OK, Json(body)).into_response()
}
