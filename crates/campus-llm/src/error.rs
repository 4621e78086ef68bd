//! Error types for campus-llm

use thiserror::Error;

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured (e.g. missing credential)
    #[error("{0}")]
    NotConfigured(String),

    /// Network error while talking to an upstream runtime
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("{message}")]
    Upstream {
        /// HTTP status returned by the upstream
        status: u16,
        /// Human-readable message (upstream error body when available)
        message: String,
    },

    /// Upstream answered without a response body
    #[error("{0} returned an empty body")]
    MissingBody(String),

    /// Upstream call exceeded the configured timeout
    #[error("upstream timeout after {0}ms")]
    Timeout(u64),

    /// The downstream client stopped reading the stream
    #[error("client disconnected")]
    ClientDisconnected,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
