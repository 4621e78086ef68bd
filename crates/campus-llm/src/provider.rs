//! Chat provider trait
//!
//! Both upstream adapters share one contract: stream the answer for a
//! window into a [`DeltaSink`] as it arrives and return the full text.

use crate::error::Result;
use crate::router::Provider;
use crate::stream::DeltaSink;
use crate::window::ConversationWindow;

/// Trait for streaming chat backends
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name (for logs)
    fn name(&self) -> &str;

    /// Which routing family this adapter serves
    fn kind(&self) -> Provider;

    /// Stream a completion for `window` using `model`.
    ///
    /// Increments are emitted in arrival order; the returned string is their
    /// exact concatenation.
    async fn stream_chat(
        &self,
        model: &str,
        window: &ConversationWindow,
        sink: &DeltaSink,
    ) -> Result<String>;
}
