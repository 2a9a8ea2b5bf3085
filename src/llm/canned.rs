//! Offline provider answering with a fixed string after a delay

use super::{ChatMessage, ProviderError, ResponseProvider};
use async_trait::async_trait;
use std::time::Duration;

/// Placeholder reply used when no real backend is configured
pub const DEMO_REPLY: &str = "I'm a demo response! To connect to OpenAI, you'll need to set up \
the backend API endpoint. I can help you implement that next.";

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_secs(1);

/// Always succeeds with the same text once `delay` has elapsed
pub struct CannedProvider {
    reply: String,
    delay: Duration,
}

impl CannedProvider {
    pub fn new(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            reply: reply.into(),
            delay,
        }
    }

    pub fn demo(delay: Duration) -> Self {
        Self::new(DEMO_REPLY, delay)
    }
}

#[async_trait]
impl ResponseProvider for CannedProvider {
    async fn reply(&self, _history: &[ChatMessage]) -> Result<String, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }

    fn model_id(&self) -> &'static str {
        "canned"
    }
}
