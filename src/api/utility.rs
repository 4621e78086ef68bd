//! Utility endpoints: template catalogue and placeholder generation

use super::{error_response, not_found, AppState};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use campus_core::pipeline::parse_body;
use campus_llm::window::coerce_text;
use serde::Serialize;

/// One template offered to the client
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Built-in templates
pub const TEMPLATES: &[Template] = &[
    Template {
        id: "summary",
        title: "Executive Summary",
        description: "Create a concise summary.",
    },
    Template {
        id: "email",
        title: "Professional Email",
        description: "Draft a polished email response.",
    },
    Template {
        id: "plan",
        title: "Action Plan",
        description: "Generate a tactical execution plan.",
    },
];

/// Generation result
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub result: String,
}

async fn templates() -> Json<&'static [Template]> {
    Json(TEMPLATES)
}

async fn generate(
    Extension(app): Extension<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let parsed = match body {
        Ok(bytes) => parse_body(&bytes[..], app.config.server.body_limit),
        Err(rejection) => Err(super::chat::body_error(&rejection)),
    };
    let body = match parsed {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let template = coerce_text(body.get("template"))
        .unwrap_or_else(|| "generic".to_string());
    let prompt = coerce_text(body.get("prompt")).unwrap_or_default();

    Json(GenerateResponse {
        result: render(&template, prompt.trim()),
    })
    .into_response()
}

fn render(template: &str, prompt: &str) -> String {
    format!(
        "Template: {template}\n\nInput:\n{prompt}\n\n\
         Generated output (placeholder):\n- Point 1\n- Point 2\n- Point 3"
    )
}

/// Create utility routes
pub fn utility_routes() -> Router {
    let list = get(templates).fallback(not_found);
    let create = post(generate).fallback(not_found);
    Router::new()
        .route("/api/utility/templates", list)
        .route("/api/utility/generate", create)
}
