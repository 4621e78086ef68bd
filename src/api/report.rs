//! AI transparency report
//!
//! The scores are fixed presentation values; `lastQuery`, `route` and
//! `cacheSize` reflect the most recent chat request.

use super::{not_found, AppState};
use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

const CONFIDENCE: f64 = 0.91;
const TRANSPARENCY_SCORE: u32 = 92;

/// Report response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub confidence: f64,
    pub bias_warnings: Vec<String>,
    pub transparency_score: u32,
    pub model_info: String,
    pub last_query: String,
    pub route: String,
    pub cache_size: usize,
}

async fn report(Extension(app): Extension<AppState>) -> Json<ReportResponse> {
    let state = &app.server_state;
    Json(ReportResponse {
        confidence: CONFIDENCE,
        bias_warnings: Vec::new(),
        transparency_score: TRANSPARENCY_SCORE,
        model_info: format!("{}:{}", app.config.mode, app.config.active_model()),
        last_query: state.last_query(),
        route: state.last_route(),
        cache_size: state.cache_len(),
    })
}

/// Create report routes
pub fn report_routes() -> Router {
    Router::new()
        .route("/api/ai/report", get(report).fallback(not_found))
}
