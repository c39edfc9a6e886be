//! HTTP channel — the contract the chat UI talks to.
//!
//! Serves the orchestration layer under `/api/`; rendering, message history
//! and page chrome stay on the UI side. Graceful shutdown is wired through a
//! [`CancellationToken`] so ctrl-c drains in-flight requests.
//!
//! ## URL layout
//!
//! ```text
//! POST /api/ask       — answer one question within a session
//! GET  /api/health    — liveness probe
//! GET  /api/sessions  — ids of live sessions (no private data)
//! ```

mod api;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::orchestrator::Orchestrator;
use crate::session::SessionStore;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — all fields are reference-counted.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: Arc<SessionStore>,
    /// Bot name echoed by the health probe.
    pub bot_name: Arc<str>,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the API router. Public so integration tests can drive it without a
/// socket.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/ask", post(api::ask))
        .route("/api/health", get(api::health))
        .route("/api/sessions", get(api::sessions))
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind and serve until `shutdown` fires.
pub async fn run(
    bind_addr: &str,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "api channel listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("server error: {e}")))?;

    info!("api channel shut down");
    Ok(())
}
