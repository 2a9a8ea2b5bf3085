//! Provider speaking the `/api/chat` request/response contract

use super::types::{ChatMessage, ChatRequest, ChatResponse};
use super::{ProviderError, ResponseProvider};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/chat";

/// Posts the full history to a chat backend and returns its `message`
pub struct HttpProvider {
    client: Client,
    endpoint: String,
    model_id: String,
}

impl HttpProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model_id: model_id.into(),
        })
    }

    fn translate_request(&self, history: &[ChatMessage]) -> ChatRequest {
        ChatRequest {
            messages: history.to_vec(),
            model: self.model_id.clone(),
        }
    }
}

/// Turn a status and body into the reply text or a failure.
///
/// Non-success statuses fail even when the body parses; a success body fails
/// when it names an error, cannot be parsed, or carries no reply.
pub(crate) fn parse_chat_response(status: u16, body: &str) -> Result<String, ProviderError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<ChatResponse>(body)
            .ok()
            .and_then(|resp| resp.error)
            .filter(|e| !e.is_empty());
        return Err(ProviderError::from_status(status, detail.as_deref()));
    }

    let resp: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("Failed to parse response: {e}")))?;

    if let Some(error) = resp.error.filter(|e| !e.is_empty()) {
        return Err(ProviderError::server_error(error));
    }

    if resp.message.trim().is_empty() {
        return Err(ProviderError::malformed("Response carried no message"));
    }

    Ok(resp.message)
}

#[async_trait]
impl ResponseProvider for HttpProvider {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
        let request = self.translate_request(history);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        parse_chat_response(status.as_u16(), &body)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
