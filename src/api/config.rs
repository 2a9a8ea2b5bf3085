//! Server configuration

use crate::llm::{ConfigError, ProviderConfig, ProviderKind};
use reqwest::Url;
use std::net::IpAddr;

pub const DEFAULT_PORT: u16 = 8000;

/// Settings for `chatdesk-server`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port bound on all interfaces
    pub port: u16,
    /// Upstream that answers `/api/chat`
    pub provider: ProviderConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    ///
    /// `CHATDESK_UPSTREAM` picks the provider; without it the server uses
    /// `OpenAI` when a key is configured and the demo reply otherwise.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut provider = ProviderConfig::from_lookup(&lookup)?;
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        provider.kind = match get("CHATDESK_UPSTREAM") {
            Some(upstream) => upstream.parse()?,
            None if provider.openai_api_key.is_some() => ProviderKind::OpenAI,
            None => ProviderKind::Canned,
        };
        let port = match get("CHATDESK_PORT") {
            Some(port) => parse_port("CHATDESK_PORT", &port)?,
            None => DEFAULT_PORT,
        };

        let config = Self { port, provider };
        config.check_upstream()?;
        Ok(config)
    }

    /// An http upstream on this host and port would forward every request
    /// back to the server itself.
    fn check_upstream(&self) -> Result<(), ConfigError> {
        if self.provider.kind != ProviderKind::Http {
            return Ok(());
        }
        // Unparseable endpoints fail on the first request instead
        let Ok(url) = Url::parse(&self.provider.endpoint) else {
            return Ok(());
        };

        let local = url.host_str().is_some_and(is_local_host);
        if local && url.port_or_known_default() == Some(self.port) {
            return Err(ConfigError::SelfForwarding {
                endpoint: self.provider.endpoint.clone(),
                port: self.port,
            });
        }
        Ok(())
    }
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort {
            name,
            value: value.to_string(),
        })
}

/// Loopback names, plus the wildcard address the server binds
fn is_local_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    match host.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => host.eq_ignore_ascii_case("localhost"),
    }
}
