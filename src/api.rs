//! HTTP API for the chat backend
//!
//! Serves the `/api/chat` contract that `HttpProvider` speaks, answering
//! from whichever upstream provider the server was started with.

mod config;
mod handlers;
mod types;


pub use config::{ServerConfig, DEFAULT_PORT};
pub use handlers::create_router;
pub use types::*;

use crate::llm::{ProviderKind, ResponseProvider};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ResponseProvider>,
    /// Which kind of provider answers, for `/api/models`
    pub upstream: ProviderKind,
}

impl AppState {
    pub fn new(provider: Arc<dyn ResponseProvider>, upstream: ProviderKind) -> Self {
        Self { provider, upstream }
    }
}
