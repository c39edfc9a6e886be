//! Harbor Bot — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at configured level
//!   4. Build classifier, backends, cache, orchestrator
//!   5. Serve the API channel until ctrl-c

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use harbor_bot::backends::{
    scripted::ScriptedBackend, semantic::SemanticHttpBackend, structured::StructuredHttpBackend,
    SemanticBackend, StructuredBackend,
};
use harbor_bot::cache::ResponseCache;
use harbor_bot::config::{self, Config};
use harbor_bot::error::AppError;
use harbor_bot::orchestrator::Orchestrator;
use harbor_bot::routing::{KeywordClassifier, Lexicon};
use harbor_bot::server::{self, ApiState};
use harbor_bot::session::SessionStore;
use harbor_bot::logger;

/// Canned structured reply for `mode = "scripted"` — carries a table so the
/// grid path can be exercised without live services.
const SCRIPTED_STRUCTURED_REPLY: &str = "\
Engagement | Territory | Status
---|---|---
Acme Health | AMER-E | Green
Globex Care | EMEA-N | Amber

Scripted sample data — switch [backends] mode to \"http\" for live figures.";

const SCRIPTED_SEMANTIC_REPLY: &str = "Scripted sample answer — switch [backends] mode to \
\"http\" to search the engagement knowledge base.";

fn main() {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<(), AppError> {
    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        bot_name = %config.bot_name,
        bind = %config.server.bind,
        backend_mode = %config.backends.mode,
        cache_ttl_seconds = config.cache.ttl_seconds,
        "config loaded"
    );

    let (semantic, structured) = build_backends(&config)?;

    let classifier = KeywordClassifier::new(
        Lexicon::new(config.routing.structured_phrases.clone()),
        Lexicon::new(config.routing.semantic_phrases.clone()),
    );

    let cache = Arc::new(ResponseCache::new(Duration::from_secs(config.cache.ttl_seconds)));

    let orchestrator = Arc::new(Orchestrator::new(
        Box::new(classifier),
        semantic,
        structured,
        cache,
        &config.limits,
        config.backends.structured.carry_conversation,
    ));

    let state = ApiState {
        orchestrator,
        sessions: Arc::new(SessionStore::new()),
        bot_name: Arc::from(config.bot_name.as_str()),
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            signal_token.cancel();
        }
    });

    server::run(&config.server.bind, state, shutdown).await
}

/// Construct the adapter pair for the configured mode.
fn build_backends(config: &Config) -> Result<(SemanticBackend, StructuredBackend), AppError> {
    match config.backends.mode.as_str() {
        "http" => {
            let semantic = SemanticHttpBackend::new(&config.backends.semantic, config.api_key.clone())
                .map_err(|e| AppError::Config(format!("semantic backend: {e}")))?;
            let structured =
                StructuredHttpBackend::new(&config.backends.structured, config.api_key.clone())
                    .map_err(|e| AppError::Config(format!("structured backend: {e}")))?;
            Ok((
                SemanticBackend::Http(semantic),
                StructuredBackend::Http(structured),
            ))
        }
        "scripted" => Ok((
            SemanticBackend::Scripted(ScriptedBackend::new(SCRIPTED_SEMANTIC_REPLY)),
            StructuredBackend::Scripted(ScriptedBackend::new(SCRIPTED_STRUCTURED_REPLY)),
        )),
        other => Err(AppError::Config(format!("unknown backend mode: {other}"))),
    }
}
