//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies the `HARBOR_LOG_LEVEL` env override. The backend API key is
//! sourced from the `BACKEND_API_KEY` env var only — never from TOML.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the API channel binds to.
    pub bind: String,
}

/// Intent-router lexicons.
///
/// Phrases are matched lower-case against the lower-cased question; keeping
/// them in config means the routing vocabulary can be tuned without a code
/// change.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Phrases that indicate a structured business-data question.
    pub structured_phrases: Vec<String>,
    /// Phrases that indicate a semantic document question.
    pub semantic_phrases: Vec<String>,
}

/// Semantic-search backend configuration (`[backends.semantic]`).
#[derive(Debug, Clone)]
pub struct SemanticBackendConfig {
    /// Full query endpoint URL.
    pub api_base_url: String,
    /// Identifier of the document index to search.
    pub knowledge_base_id: String,
    /// Generation model identifier passed with every query.
    pub model_identifier: String,
    /// How many passages the backend retrieves per query.
    pub number_of_results: u32,
    /// Retrieval mode hint (e.g. `"HYBRID"`, `"SEMANTIC"`).
    pub search_mode: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Structured-query backend configuration (`[backends.structured]`).
#[derive(Debug, Clone)]
pub struct StructuredBackendConfig {
    /// Full chat endpoint URL.
    pub api_base_url: String,
    /// Identifier of the assistant application to address.
    pub application_id: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether the continuation token from the last reply is sent with the
    /// next question in the same session.
    pub carry_conversation: bool,
}

/// Backends subsystem configuration.
#[derive(Debug, Clone)]
pub struct BackendsConfig {
    /// Which adapter set is active: `"http"` for the real services,
    /// `"scripted"` for canned local replies.
    pub mode: String,
    pub semantic: SemanticBackendConfig,
    pub structured: StructuredBackendConfig,
}

/// Response-cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a cached answer stays valid.
    pub ttl_seconds: u64,
}

/// Input and output bounds.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Questions longer than this are refused before any backend call.
    pub max_question_chars: usize,
    /// How many citations are surfaced per answer.
    pub citation_limit: usize,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub backends: BackendsConfig,
    pub cache: CacheConfig,
    pub limits: LimitsConfig,
    /// API key from `BACKEND_API_KEY` env var — `None` for unauthenticated
    /// endpoints. Never sourced from TOML.
    pub api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    supervisor: RawSupervisor,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    routing: RawRouting,
    #[serde(default)]
    backends: RawBackends,
    #[serde(default)]
    cache: RawCache,
    #[serde(default)]
    limits: RawLimits,
}

#[derive(Deserialize)]
struct RawSupervisor {
    bot_name: String,
    log_level: String,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Deserialize)]
struct RawRouting {
    #[serde(default = "default_structured_phrases")]
    structured_phrases: Vec<String>,
    #[serde(default = "default_semantic_phrases")]
    semantic_phrases: Vec<String>,
}

impl Default for RawRouting {
    fn default() -> Self {
        Self {
            structured_phrases: default_structured_phrases(),
            semantic_phrases: default_semantic_phrases(),
        }
    }
}

#[derive(Deserialize)]
struct RawBackends {
    /// Maps to `mode = "..."` in `[backends]`.
    #[serde(default = "default_backend_mode")]
    mode: String,
    #[serde(default)]
    semantic: RawSemantic,
    #[serde(default)]
    structured: RawStructured,
}

impl Default for RawBackends {
    fn default() -> Self {
        Self {
            mode: default_backend_mode(),
            semantic: RawSemantic::default(),
            structured: RawStructured::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawSemantic {
    #[serde(default)]
    api_base_url: String,
    #[serde(default)]
    knowledge_base_id: String,
    #[serde(default)]
    model_identifier: String,
    #[serde(default = "default_number_of_results")]
    number_of_results: u32,
    #[serde(default = "default_search_mode")]
    search_mode: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawSemantic {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            knowledge_base_id: String::new(),
            model_identifier: String::new(),
            number_of_results: default_number_of_results(),
            search_mode: default_search_mode(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawStructured {
    #[serde(default)]
    api_base_url: String,
    #[serde(default)]
    application_id: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_true")]
    carry_conversation: bool,
}

impl Default for RawStructured {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            application_id: String::new(),
            timeout_seconds: default_timeout_seconds(),
            carry_conversation: true,
        }
    }
}

#[derive(Deserialize)]
struct RawCache {
    #[serde(default = "default_cache_ttl_seconds")]
    ttl_seconds: u64,
}

impl Default for RawCache {
    fn default() -> Self {
        Self { ttl_seconds: default_cache_ttl_seconds() }
    }
}

#[derive(Deserialize)]
struct RawLimits {
    #[serde(default = "default_max_question_chars")]
    max_question_chars: usize,
    #[serde(default = "default_citation_limit")]
    citation_limit: usize,
}

impl Default for RawLimits {
    fn default() -> Self {
        Self {
            max_question_chars: default_max_question_chars(),
            citation_limit: default_citation_limit(),
        }
    }
}

fn default_bind() -> String { "127.0.0.1:8080".to_string() }
fn default_backend_mode() -> String { "scripted".to_string() }
fn default_number_of_results() -> u32 { 10 }
fn default_search_mode() -> String { "HYBRID".to_string() }
fn default_timeout_seconds() -> u64 { 60 }
fn default_cache_ttl_seconds() -> u64 { 600 }
fn default_max_question_chars() -> usize { 2000 }
fn default_citation_limit() -> usize { 3 }

fn default_true() -> bool {
    true
}

/// Production routing vocabulary — structured business-data phrases.
fn default_structured_phrases() -> Vec<String> {
    [
        "territory",
        "sfdc customer",
        "revenue realization",
        "partner performance",
        "migration status",
        "detailed report",
        "ytd revenue",
        "spend variance",
        "customer territory code",
        "engagement id",
        "migration delivered by",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Production routing vocabulary — semantic document phrases.
fn default_semantic_phrases() -> Vec<String> {
    [
        "explain",
        "how to",
        "what is",
        "describe",
        "summary",
        "overview",
        "best practices",
        "recommendations",
        "challenges",
        "insights",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let log_level_override = env::var("HARBOR_LOG_LEVEL").ok();
    load_from(Path::new("config/default.toml"), log_level_override.as_deref())
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, log_level_override: Option<&str>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let s = parsed.supervisor;
    let log_level = log_level_override.unwrap_or(&s.log_level).to_string();

    Ok(Config {
        bot_name: s.bot_name,
        log_level,
        server: ServerConfig { bind: parsed.server.bind },
        routing: RoutingConfig {
            structured_phrases: parsed.routing.structured_phrases,
            semantic_phrases: parsed.routing.semantic_phrases,
        },
        backends: BackendsConfig {
            mode: parsed.backends.mode,
            semantic: SemanticBackendConfig {
                api_base_url: parsed.backends.semantic.api_base_url,
                knowledge_base_id: parsed.backends.semantic.knowledge_base_id,
                model_identifier: parsed.backends.semantic.model_identifier,
                number_of_results: parsed.backends.semantic.number_of_results,
                search_mode: parsed.backends.semantic.search_mode,
                timeout_seconds: parsed.backends.semantic.timeout_seconds,
            },
            structured: StructuredBackendConfig {
                api_base_url: parsed.backends.structured.api_base_url,
                application_id: parsed.backends.structured.application_id,
                timeout_seconds: parsed.backends.structured.timeout_seconds,
                carry_conversation: parsed.backends.structured.carry_conversation,
            },
        },
        cache: CacheConfig { ttl_seconds: parsed.cache.ttl_seconds },
        limits: LimitsConfig {
            max_question_chars: parsed.limits.max_question_chars,
            citation_limit: parsed.limits.citation_limit,
        },
        api_key: env::var("BACKEND_API_KEY").ok(),
    })
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests — scripted backends, no API keys, no
/// external calls.
#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            server: ServerConfig { bind: default_bind() },
            routing: RoutingConfig {
                structured_phrases: default_structured_phrases(),
                semantic_phrases: default_semantic_phrases(),
            },
            backends: BackendsConfig {
                mode: "scripted".into(),
                semantic: SemanticBackendConfig {
                    api_base_url: "http://localhost:0/query".into(),
                    knowledge_base_id: "kb-test".into(),
                    model_identifier: "test-model".into(),
                    number_of_results: default_number_of_results(),
                    search_mode: default_search_mode(),
                    timeout_seconds: 1,
                },
                structured: StructuredBackendConfig {
                    api_base_url: "http://localhost:0/chat".into(),
                    application_id: "app-test".into(),
                    timeout_seconds: 1,
                    carry_conversation: true,
                },
            },
            cache: CacheConfig { ttl_seconds: 1 },
            limits: LimitsConfig {
                max_question_chars: default_max_question_chars(),
                citation_limit: default_citation_limit(),
            },
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[supervisor]
bot_name = "test-bot"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_minimal_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None).unwrap();
        assert_eq!(cfg.bot_name, "test-bot");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.backends.mode, "scripted");
        assert_eq!(cfg.cache.ttl_seconds, 600);
        assert_eq!(cfg.limits.citation_limit, 3);
    }

    #[test]
    fn default_lexicons_populated() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None).unwrap();
        assert!(cfg.routing.structured_phrases.iter().any(|p| p == "territory"));
        assert!(cfg.routing.semantic_phrases.iter().any(|p| p == "best practices"));
    }

    #[test]
    fn lexicons_overridable_from_toml() {
        let f = write_toml(
            r#"
[supervisor]
bot_name = "test-bot"
log_level = "info"

[routing]
structured_phrases = ["invoice"]
semantic_phrases = ["why"]
"#,
        );
        let cfg = load_from(f.path(), None).unwrap();
        assert_eq!(cfg.routing.structured_phrases, vec!["invoice".to_string()]);
        assert_eq!(cfg.routing.semantic_phrases, vec!["why".to_string()]);
    }

    #[test]
    fn backend_sections_parse() {
        let f = write_toml(
            r#"
[supervisor]
bot_name = "test-bot"
log_level = "info"

[backends]
mode = "http"

[backends.semantic]
api_base_url = "https://search.example/query"
knowledge_base_id = "kb-1"
model_identifier = "model-a"
number_of_results = 5

[backends.structured]
api_base_url = "https://assistant.example/chat"
application_id = "app-1"
carry_conversation = false
"#,
        );
        let cfg = load_from(f.path(), None).unwrap();
        assert_eq!(cfg.backends.mode, "http");
        assert_eq!(cfg.backends.semantic.knowledge_base_id, "kb-1");
        assert_eq!(cfg.backends.semantic.number_of_results, 5);
        assert_eq!(cfg.backends.semantic.search_mode, "HYBRID");
        assert_eq!(cfg.backends.structured.application_id, "app-1");
        assert!(!cfg.backends.structured.carry_conversation);
    }

    #[test]
    fn test_default_is_offline_safe() {
        let cfg = Config::test_default();
        assert_eq!(cfg.backends.mode, "scripted");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("debug")).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }
}
