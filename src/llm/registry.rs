//! Provider selection from configuration

use super::{
    CannedProvider, HttpProvider, LoggingProvider, OpenAIProvider, ProviderError,
    ResponseProvider, DEFAULT_ENDPOINT, DEFAULT_REPLY_DELAY,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which provider implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// `POST /api/chat` backend
    #[default]
    Http,
    /// `OpenAI` chat completions, called directly
    OpenAI,
    /// Fixed demo reply after a delay, no network
    Canned,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(ProviderKind::Http),
            "openai" => Ok(ProviderKind::OpenAI),
            "canned" | "demo" => Ok(ProviderKind::Canned),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Http => "http",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Canned => "canned",
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown provider '{0}' (expected http, openai or canned)")]
    UnknownProvider(String),
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be a port number, got '{value}'")]
    InvalidPort { name: &'static str, value: String },
    #[error("OPENAI_API_KEY is required for the openai provider")]
    MissingApiKey,
    #[error("Upstream {endpoint} is this server's own port {port}")]
    SelfForwarding { endpoint: String, port: u16 },
    #[error("Failed to build provider: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration for response providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Chat backend URL for the http provider
    pub endpoint: String,
    /// Model identifier sent with each request
    pub model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    /// HTTP client timeout for network providers
    pub timeout: Duration,
    /// Delay before the canned provider answers
    pub reply_delay: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            openai_api_key: None,
            openai_base_url: None,
            timeout: DEFAULT_TIMEOUT,
            reply_delay: DEFAULT_REPLY_DELAY,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or empty variables keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(kind) = get("CHATDESK_PROVIDER") {
            config.kind = kind.parse()?;
        }
        if let Some(endpoint) = get("CHATDESK_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(model) = get("CHATDESK_MODEL") {
            config.model = model;
        }
        if let Some(secs) = get("CHATDESK_TIMEOUT_SECS") {
            let secs = parse_number("CHATDESK_TIMEOUT_SECS", &secs)?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = get("CHATDESK_REPLY_DELAY_MS") {
            let ms = parse_number("CHATDESK_REPLY_DELAY_MS", &ms)?;
            config.reply_delay = Duration::from_millis(ms);
        }
        config.openai_api_key = get("OPENAI_API_KEY");
        config.openai_base_url = get("OPENAI_BASE_URL");

        Ok(config)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

/// Create the configured provider, wrapped with logging
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn ResponseProvider>, ConfigError> {
    let provider: Arc<dyn ResponseProvider> = match config.kind {
        ProviderKind::Http => Arc::new(HttpProvider::new(
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout,
        )?),
        ProviderKind::OpenAI => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or(ConfigError::MissingApiKey)?;
            Arc::new(OpenAIProvider::new(
                api_key,
                config.model.clone(),
                config.openai_base_url.as_deref(),
                config.timeout,
            )?)
        }
        ProviderKind::Canned => Arc::new(CannedProvider::demo(config.reply_delay)),
    };

    Ok(Arc::new(LoggingProvider::new(provider)))
}
