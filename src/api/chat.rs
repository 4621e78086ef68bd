//! Streaming chat endpoint
//!
//! Headers are decided before the body starts: `x-cache` tells whether the
//! answer is a cache replay and `x-route-tier` names the selected tier. The
//! answer itself is produced by a spawned pipeline task and drained from a
//! channel into a chunked `text/plain` body.

use super::{not_found, AppState};
use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::Extension;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use campus_core::Error;
use campus_llm::stream::DEFAULT_CHANNEL_CAPACITY;
use campus_llm::DeltaSink;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Cache outcome header
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Selected tier header
pub const X_ROUTE_TIER: HeaderName = HeaderName::from_static("x-route-tier");

/// Map a body extraction failure onto the pipeline's input errors
pub fn body_error(rejection: &BytesRejection) -> Error {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::BodyTooLarge
    } else {
        Error::InvalidBody
    }
}

fn text_body(rx: mpsc::Receiver<String>) -> Body {
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|text| (Ok::<_, Infallible>(text), rx))
    });
    Body::from_stream(stream)
}

async fn chat(
    Extension(app): Extension<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let plan = match &body {
        Ok(bytes) => app.pipeline.prepare(Ok(&bytes[..])),
        Err(rejection) => app.pipeline.prepare(Err(body_error(rejection))),
    };

    let cache = plan.cache_status().as_str();
    let tier = plan.decision().map_or("none", |d| d.tier.as_str());

    let (sink, rx) = DeltaSink::channel(DEFAULT_CHANNEL_CAPACITY);
    let pipeline = Arc::clone(&app.pipeline);
    tokio::spawn(async move {
        let request_id = plan.request_id();
        let outcome = pipeline.execute(plan, sink).await;
        debug!(%request_id, ?outcome, "chat finished");
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (X_CACHE, cache),
            (X_ROUTE_TIER, tier),
        ],
        text_body(rx),
    )
        .into_response()
}

/// Create chat routes
pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat", post(chat).fallback(not_found))
}
