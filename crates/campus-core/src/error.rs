//! Error types for campus-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Request body exceeded the size ceiling
    #[error("Request body too large")]
    BodyTooLarge,

    /// Request body was not valid JSON
    #[error("Invalid JSON body")]
    InvalidBody,

    /// Upstream provider error
    #[error(transparent)]
    Llm(#[from] campus_llm::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The client went away mid-stream
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Llm(campus_llm::Error::ClientDisconnected))
    }
}
