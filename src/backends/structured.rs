//! Structured-query adapter — conversational assistant over business data.
//!
//! The only adapter that deals in continuation tokens: the service returns
//! one with each reply, and sending it back resumes the same multi-turn
//! context. Token storage lives upstream (see `session`); this adapter just
//! moves it across the wire.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::StructuredBackendConfig;
use super::{check_status, AnswerResult, BackendError, BackendKind, Citation};

#[derive(Debug, Clone)]
pub struct StructuredHttpBackend {
    client: Client,
    api_base_url: String,
    application_id: String,
    api_key: Option<String>,
}

impl StructuredHttpBackend {
    /// Build the adapter from config and an optional API key.
    ///
    /// `api_key` comes from the `BACKEND_API_KEY` env var — never TOML.
    pub fn new(
        config: &StructuredBackendConfig,
        api_key: Option<String>,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            application_id: config.application_id.clone(),
            api_key,
        })
    }

    /// One chat round trip, optionally resuming a prior conversation.
    pub(crate) async fn chat(
        &self,
        question: &str,
        conversation_token: Option<&str>,
    ) -> Result<AnswerResult, BackendError> {
        let payload = ChatRequest {
            application_id: &self.application_id,
            user_message: question,
            conversation_token,
        };

        debug!(
            application_id = %payload.application_id,
            resuming = conversation_token.is_some(),
            question_len = question.len(),
            "sending structured query"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full structured request payload");
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
            .json::<ChatResponse>()
            .await
            .map_err(|e| BackendError::Response(format!("failed to parse response body: {e}")))?;

        debug!(
            attributions = parsed.source_attributions.len(),
            token_returned = parsed.conversation_token.is_some(),
            "received structured answer"
        );

        Ok(AnswerResult {
            source: BackendKind::Structured,
            // The service omits the message on some no-answer paths.
            text: parsed.system_message.unwrap_or_else(|| "No response".to_string()),
            citations: parsed
                .source_attributions
                .into_iter()
                .enumerate()
                .map(|(i, a)| a.into_citation(i))
                .collect(),
            conversation_token: parsed.conversation_token,
        })
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    application_id: &'a str,
    user_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    #[serde(default)]
    system_message: Option<String>,
    #[serde(default)]
    source_attributions: Vec<Attribution>,
    #[serde(default)]
    conversation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attribution {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl Attribution {
    fn into_citation(self, index: usize) -> Citation {
        Citation {
            label: self.title.unwrap_or_else(|| format!("Source {}", index + 1)),
            url: self.url,
            snippet: self.snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialises_with_token() {
        let payload = ChatRequest {
            application_id: "app-1",
            user_message: "show migration status",
            conversation_token: Some("conv-7"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["applicationId"], "app-1");
        assert_eq!(json["userMessage"], "show migration status");
        assert_eq!(json["conversationToken"], "conv-7");
    }

    #[test]
    fn request_omits_absent_token() {
        let payload = ChatRequest {
            application_id: "app-1",
            user_message: "first question",
            conversation_token: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("conversationToken").is_none());
    }

    #[test]
    fn response_parses_full_shape() {
        let body = r#"{
            "systemMessage": "Territory A | Territory B",
            "sourceAttributions": [{"title": "SFDC extract", "url": "https://example/x"}],
            "conversationToken": "conv-8"
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.system_message.as_deref(), Some("Territory A | Territory B"));
        assert_eq!(parsed.source_attributions.len(), 1);
        assert_eq!(parsed.conversation_token.as_deref(), Some("conv-8"));
    }

    #[test]
    fn missing_message_becomes_no_response() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.system_message.is_none());
        // The adapter substitutes the placeholder on this path.
        let answer_text = parsed.system_message.unwrap_or_else(|| "No response".to_string());
        assert_eq!(answer_text, "No response");
    }
}
