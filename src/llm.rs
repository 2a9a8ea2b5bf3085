//! Response provider abstraction
//!
//! Given the conversation so far, produce the next assistant message. The
//! submission flow only ever sees this trait, so the HTTP contract, a direct
//! `OpenAI` connection and the offline demo reply are interchangeable.

mod canned;
mod error;
mod http;
mod openai;
mod registry;
mod types;


pub use canned::{CannedProvider, DEFAULT_REPLY_DELAY, DEMO_REPLY};
pub use error::{ProviderError, ProviderErrorKind};
pub use http::{HttpProvider, DEFAULT_ENDPOINT};
pub use openai::{OpenAIProvider, DEFAULT_OPENAI_BASE_URL};
pub use registry::{build_provider, ConfigError, ProviderConfig, ProviderKind, DEFAULT_MODEL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for reply producers
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Produce the next assistant message for `history` (oldest first)
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError>;

    /// Model identifier sent with requests and shown in logs
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ResponseProvider + ?Sized> ResponseProvider for Arc<T> {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
        (**self).reply(history).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for response providers
pub struct LoggingProvider {
    inner: Arc<dyn ResponseProvider>,
    model_id: String,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn ResponseProvider>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ResponseProvider for LoggingProvider {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
        let start = Instant::now();
        let result = self.inner.reply(history).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    history_len = history.len(),
                    reply_chars = reply.chars().count(),
                    "Provider reply completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    history_len = history.len(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Provider reply failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
