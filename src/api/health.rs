//! Health, readiness and counters.
//!
//! Provides:
//! - `/health`: mode, routing summary and active model
//! - `/ready`: whether the configured upstream can take traffic
//! - `/metrics`: runtime counters as JSON

use super::{error_response, not_found, AppState};
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use campus_core::{MetricsSnapshot, Mode};
use serde::Serialize;
use tracing::warn;

/// Routing summary reported by `/health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingSummary {
    pub smart: bool,
    pub cloud_escalation: bool,
    pub fast: String,
    pub balanced: String,
    pub quality: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub mode: Mode,
    pub routing: RoutingSummary,
    pub model: String,
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ok: bool,
    pub mode: Mode,
}

async fn health(Extension(app): Extension<AppState>) -> Json<HealthResponse> {
    let config = &app.config;
    Json(HealthResponse {
        ok: true,
        mode: config.mode,
        routing: RoutingSummary {
            smart: config.routing.smart,
            cloud_escalation: config.routing.cloud_escalation,
            fast: config.local.fast(),
            balanced: config.local.balanced(),
            quality: config.local.quality(),
        },
        model: config.active_model().to_string(),
    })
}

async fn ready(Extension(app): Extension<AppState>) -> Response {
    let mode = app.config.mode;
    match mode {
        Mode::Cloud if app.config.cloud.api_key.is_empty() => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "cloud mode configured but CLOUD_API_KEY is missing",
        ),
        Mode::Cloud => Json(ReadyResponse { ok: true, mode }).into_response(),
        Mode::Local => match app.local.check_ready(app.config.ready_timeout()).await {
            Ok(()) => Json(ReadyResponse { ok: true, mode }).into_response(),
            Err(e) => {
                warn!(error = %e, "readiness check failed");
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "local model runtime is not ready",
                )
            }
        },
    }
}

async fn metrics(Extension(app): Extension<AppState>) -> Json<MetricsSnapshot> {
    Json(app.server_state.metrics().snapshot())
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/ready", get(ready).fallback(not_found))
        .route("/metrics", get(metrics).fallback(not_found))
}
