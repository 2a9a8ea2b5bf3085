//! HTTP request handlers

use super::types::{ModelInfo, ModelsResponse};
use super::AppState;
use crate::llm::{ChatRequest, ChatResponse, ProviderError, ProviderKind};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::time::Instant;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat completion
        .route("/api/chat", post(chat))
        // Model info
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if request.messages.is_empty() {
        return Err(AppError::BadRequest(
            "messages must not be empty".to_string(),
        ));
    }

    // The requested model is advisory; the configured upstream always answers
    tracing::info!(
        requested_model = %request.model,
        upstream_model = %state.provider.model_id(),
        messages = request.messages.len(),
        "Chat request"
    );

    let start = Instant::now();
    let reply = state
        .provider
        .reply(&request.messages)
        .await
        .map_err(AppError::Upstream)?;

    tracing::debug!(
        duration_ms = %start.elapsed().as_millis(),
        reply_chars = reply.chars().count(),
        "Chat reply sent"
    );

    Ok(Json(ChatResponse::reply(reply)))
}

// ============================================================
// Model Info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let id = state.provider.model_id().to_string();
    let description = match state.upstream {
        ProviderKind::OpenAI => "OpenAI chat completions",
        ProviderKind::Http => "Forwarded to another chat backend",
        ProviderKind::Canned => "Fixed demo reply, no network",
    };

    Json(ModelsResponse {
        models: vec![ModelInfo {
            id: id.clone(),
            provider: state.upstream.to_string(),
            description: description.to_string(),
        }],
        default: id,
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("chatdesk ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Upstream(ProviderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(e) => {
                tracing::warn!(
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Upstream provider failed"
                );
                (StatusCode::BAD_GATEWAY, e.message)
            }
        };

        // Same shape as a successful reply so clients parse one body type
        let body = Json(ChatResponse::failure(message));
        (status, body).into_response()
    }
}
