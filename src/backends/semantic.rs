//! Semantic-search adapter — retrieve-and-generate over the document index.
//!
//! Wire types are private to this module; callers only see [`AnswerResult`].
//! The service is stateless per call: there is no conversation handle in
//! either direction.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SemanticBackendConfig;
use super::{check_status, AnswerResult, BackendError, BackendKind, Citation};

/// HTTP adapter for the semantic-search service.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct SemanticHttpBackend {
    client: Client,
    api_base_url: String,
    knowledge_base_id: String,
    model_identifier: String,
    number_of_results: u32,
    search_mode: String,
    api_key: Option<String>,
}

impl SemanticHttpBackend {
    /// Build the adapter from config and an optional API key.
    ///
    /// `api_key` comes from the `BACKEND_API_KEY` env var — `None` for
    /// unauthenticated endpoints. When present it is sent as
    /// `Authorization: Bearer <key>` on every request.
    pub fn new(
        config: &SemanticBackendConfig,
        api_key: Option<String>,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            knowledge_base_id: config.knowledge_base_id.clone(),
            model_identifier: config.model_identifier.clone(),
            number_of_results: config.number_of_results,
            search_mode: config.search_mode.clone(),
            api_key,
        })
    }

    /// One retrieve-and-generate round trip.
    pub(crate) async fn query(&self, question: &str) -> Result<AnswerResult, BackendError> {
        let payload = QueryRequest {
            query_text: question,
            knowledge_base_id: &self.knowledge_base_id,
            model_identifier: &self.model_identifier,
            number_of_results: self.number_of_results,
            search_mode: &self.search_mode,
        };

        debug!(
            knowledge_base_id = %payload.knowledge_base_id,
            number_of_results = payload.number_of_results,
            question_len = question.len(),
            "sending semantic query"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full semantic request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let response = check_status(response).await?;

        let parsed = response
            .json::<QueryResponse>()
            .await
            .map_err(|e| BackendError::Response(format!("failed to parse response body: {e}")))?;

        debug!(citations = parsed.citation_list.len(), "received semantic answer");

        Ok(AnswerResult {
            source: BackendKind::Semantic,
            text: parsed.generated_text,
            citations: parsed
                .citation_list
                .into_iter()
                .enumerate()
                .map(|(i, c)| c.into_citation(i))
                .collect(),
            conversation_token: None,
        })
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query_text: &'a str,
    knowledge_base_id: &'a str,
    model_identifier: &'a str,
    number_of_results: u32,
    search_mode: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    generated_text: String,
    #[serde(default)]
    citation_list: Vec<CitationItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitationItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl CitationItem {
    /// Position-based fallback label keeps citations addressable even when
    /// the service omits titles.
    fn into_citation(self, index: usize) -> Citation {
        Citation {
            label: self.title.unwrap_or_else(|| format!("Source {}", index + 1)),
            url: self.uri,
            snippet: self.snippet,
        }
    }
}
