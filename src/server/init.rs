//! Server initialization
//!
//! Builds the provider adapters, shared state and router from an
//! [`AppConfig`], then serves until Ctrl-C or SIGTERM.

use super::config::AppConfig;
use super::validation::{validate_config, warn_on_risky_config};
use crate::api::{self, AppState};
use crate::middleware::{cors, metrics};
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderValue};
use axum::{middleware as axum_middleware, Extension, Router, ServiceExt};
use campus_core::{ChatPipeline, ResponseCache, ServerState};
use campus_llm::{OllamaProvider, OpenAiProvider, RouteSelector};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Wire providers, state and pipeline for `config`
pub fn build_app_state(config: AppConfig) -> Result<AppState> {
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let local = Arc::new(OllamaProvider::with_client(
        client.clone(),
        config.ollama_config(),
    ));
    let cloud = Arc::new(OpenAiProvider::with_client(client, config.openai_config()));

    let server_state = Arc::new(ServerState::new(ResponseCache::with_ttl(
        config.cache.capacity,
        config.cache_ttl(),
    )));

    let pipeline = Arc::new(ChatPipeline::new(
        config.pipeline_config(),
        RouteSelector::new(config.routing_config()),
        local.clone(),
        cloud,
        Arc::clone(&server_state),
    ));

    Ok(AppState {
        config: Arc::new(config),
        pipeline,
        server_state,
        local,
    })
}

/// Build the HTTP router with all endpoints and layers
pub fn build_router(app: AppState) -> Router {
    let body_limit = app.config.server.body_limit;
    let server_state = Arc::clone(&app.server_state);

    Router::new()
        .merge(api::health_routes())
        .merge(api::api_router())
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(app))
        .layer(TraceLayer::new_for_http())
        .layer(cors::cors_layer())
        .layer(axum_middleware::from_fn(cors::preflight))
        .layer(metrics::RequestCountLayer::new(server_state))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

/// Wrap the router so `/health/` and `/health` reach the same route
pub fn build_app(app: AppState) -> NormalizePath<Router> {
    let router = build_router(app);
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}

/// Run the server until a shutdown signal arrives
pub async fn run(config: AppConfig) -> Result<()> {
    validate_config(&config)?;
    warn_on_risky_config(&config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!(
        mode = %config.mode,
        model = config.active_model(),
        smart_routing = config.routing.smart,
        cloud_escalation = config.routing.cloud_escalation,
        "Starting Campus v{}",
        env!("CARGO_PKG_VERSION")
    );

    let app = build_app(build_app_state(config)?);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Campus shutdown complete");
    Ok(())
}
