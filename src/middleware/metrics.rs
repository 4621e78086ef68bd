//! Request counter
//!
//! Wraps the whole router so preflights and 404s are counted too.

use axum::http::Request;
use axum::response::Response;
use campus_core::ServerState;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer counting every request into [`ServerState`] metrics
#[derive(Clone)]
pub struct RequestCountLayer {
    state: Arc<ServerState>,
}

impl RequestCountLayer {
    /// Create a counting layer over the shared state
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for RequestCountLayer {
    type Service = RequestCountService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestCountService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Service wrapper produced by [`RequestCountLayer`]
#[derive(Clone)]
pub struct RequestCountService<S> {
    inner: S,
    state: Arc<ServerState>,
}

impl<S, B> Service<Request<B>> for RequestCountService<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        self.state.metrics().record_request();
        self.inner.call(req)
    }
}
