//! Integration tests for the HTTP channel, driven in-process via
//! `tower::util::ServiceExt::oneshot` — no sockets.
//!
//! Run with:
//!   cargo test --test test_api

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use harbor_bot::backends::scripted::ScriptedBackend;
use harbor_bot::backends::{SemanticBackend, StructuredBackend};
use harbor_bot::cache::ResponseCache;
use harbor_bot::config::LimitsConfig;
use harbor_bot::orchestrator::Orchestrator;
use harbor_bot::routing::{KeywordClassifier, Lexicon};
use harbor_bot::server::{router, ApiState};
use harbor_bot::session::SessionStore;

// ── helpers ──────────────────────────────────────────────────────────────────

fn app_with(structured: ScriptedBackend, semantic: ScriptedBackend) -> Router {
    let classifier = KeywordClassifier::new(
        Lexicon::new(["migration status".to_string()]),
        Lexicon::new(["explain".to_string()]),
    );
    let orchestrator = Orchestrator::new(
        Box::new(classifier),
        SemanticBackend::Scripted(semantic),
        StructuredBackend::Scripted(structured),
        Arc::new(ResponseCache::new(Duration::ZERO)),
        &LimitsConfig { max_question_chars: 100, citation_limit: 3 },
        true,
    );
    router(ApiState {
        orchestrator: Arc::new(orchestrator),
        sessions: Arc::new(SessionStore::new()),
        bot_name: Arc::from("harbor-test"),
    })
}

async fn post_ask(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ask")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

// ── /api/ask ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ask_answers_and_allocates_a_session() {
    let app = app_with(
        ScriptedBackend::new("numbers"),
        ScriptedBackend::new("prose"),
    );

    let (status, body) = post_ask(&app, json!({ "question": "migration status" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["session_id"].as_str().unwrap().is_empty());
    assert_eq!(body["route"], "structured");
    assert_eq!(body["sections"][0]["source"], "structured");
    assert_eq!(body["sections"][0]["text"], "numbers");
    assert!(body["combined"].as_str().unwrap().contains("numbers"));
}

#[tokio::test]
async fn ask_carries_conversation_across_requests_in_one_session() {
    let structured = ScriptedBackend::new("numbers").with_token("conv-7");
    let app = app_with(structured.clone(), ScriptedBackend::new("prose"));

    let (_, first) = post_ask(&app, json!({ "question": "migration status one" })).await;
    let session_id = first["session_id"].as_str().unwrap().to_string();
    assert_eq!(structured.last_token_in(), None);

    let (_, second) = post_ask(
        &app,
        json!({ "question": "migration status two", "session_id": session_id }),
    )
    .await;

    assert_eq!(second["session_id"].as_str().unwrap(), session_id);
    assert_eq!(structured.last_token_in().as_deref(), Some("conv-7"));
}

#[tokio::test]
async fn ask_merges_both_backends_on_ambiguous_questions() {
    let app = app_with(
        ScriptedBackend::new("numbers"),
        ScriptedBackend::new("prose"),
    );

    let (status, body) = post_ask(&app, json!({ "question": "hello" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"], "both");
    assert_eq!(body["sections"].as_array().unwrap().len(), 2);
    assert_eq!(body["sections"][0]["source"], "structured");
    assert_eq!(body["sections"][1]["source"], "semantic");
}

#[tokio::test]
async fn oversized_question_is_refused_with_400() {
    let app = app_with(ScriptedBackend::new("n"), ScriptedBackend::new("p"));

    let long = "x".repeat(101);
    let (status, body) = post_ask(&app, json!({ "question": long })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_question");
    assert!(body["message"].as_str().unwrap().contains("too long"));
}

#[tokio::test]
async fn failed_backend_still_returns_200_with_safe_text() {
    let app = app_with(ScriptedBackend::failing(), ScriptedBackend::new("prose"));

    let (status, body) = post_ask(&app, json!({ "question": "hello" })).await;

    assert_eq!(status, StatusCode::OK);
    let structured_text = body["sections"][0]["text"].as_str().unwrap();
    assert!(structured_text.contains("could not be reached"));
    assert!(!structured_text.contains("scripted"));
    assert_eq!(body["sections"][1]["text"], "prose");
}

// ── /api/health and /api/sessions ────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(ScriptedBackend::new("n"), ScriptedBackend::new("p"));

    let (status, body) = get_json(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["bot"], "harbor-test");
}

#[tokio::test]
async fn sessions_lists_allocated_ids() {
    let app = app_with(ScriptedBackend::new("n"), ScriptedBackend::new("p"));

    let (_, first) = post_ask(&app, json!({ "question": "hello" })).await;
    let id = first["session_id"].as_str().unwrap().to_string();

    let (status, body) = get_json(&app, "/api/sessions").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&id));
}
