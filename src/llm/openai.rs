//! `OpenAI` and `OpenAI`-compatible chat completions provider

use super::types::ChatMessage;
use super::{ProviderError, ResponseProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Calls `{base_url}/chat/completions` directly
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAIProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let base_url = base_url.unwrap_or(DEFAULT_OPENAI_BASE_URL);
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            url,
        })
    }

    pub(super) fn translate_request(&self, history: &[ChatMessage]) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: history
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
        }
    }

    pub(super) fn normalize_response(resp: OpenAIResponse) -> Result<String, ProviderError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed("No choices in response"))?;

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::malformed("Empty content in response")),
        }
    }

    pub(super) fn classify_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
        if let Ok(error_resp) = serde_json::from_str::<OpenAIErrorResponse>(body) {
            let message = error_resp.error.message;
            let mut err = match status.as_u16() {
                401 | 403 => ProviderError::auth(format!("Authentication failed: {message}")),
                429 => ProviderError::rate_limit(format!("Rate limit exceeded: {message}")),
                400 => ProviderError::invalid_request(format!("Invalid request: {message}")),
                500..=599 => ProviderError::server_error(format!("Server error: {message}")),
                _ => ProviderError::unknown(format!("HTTP {status}: {message}")),
            };
            err.status = Some(status.as_u16());
            return err;
        }
        ProviderError::from_status(status.as_u16(), Some(body).filter(|b| !b.is_empty()))
    }
}

#[async_trait]
impl ResponseProvider for OpenAIProvider {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
        let request = self.translate_request(history);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::malformed(format!("Failed to parse response: {e}")))?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoice {
    pub message: OpenAIChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
