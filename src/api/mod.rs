//! HTTP API for Campus
//!
//! Provides endpoints for:
//! - Health, readiness and runtime counters
//! - Utility templates and placeholder generation
//! - The AI transparency report
//! - Streaming chat

pub mod chat;
pub mod health;
pub mod report;
pub mod utility;

use crate::server::config::AppConfig;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Router;
use campus_core::{ChatPipeline, ServerState};
use campus_llm::OllamaProvider;
use serde::Serialize;
use std::sync::Arc;

pub use chat::chat_routes;
pub use health::health_routes;
pub use report::report_routes;
pub use utility::utility_routes;

/// Shared handler state, injected as an `Extension`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<ChatPipeline>,
    pub server_state: Arc<ServerState>,
    /// Local adapter, checked by `/ready`
    pub local: Arc<OllamaProvider>,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build a JSON error response
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Unknown method or path
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

/// Create the `/api` router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(utility_routes())
        .merge(report_routes())
        .merge(chat_routes())
}
