//! Streaming relay
//!
//! Providers decode upstream framing into text increments and push them
//! through a [`DeltaSink`]. The HTTP layer drains the receiving end, so the
//! producer (upstream read loop) and the writer (client connection) are
//! decoupled while arrival order is preserved.
//!
//! - `ndjson`: newline-delimited JSON (local runtime)
//! - `sse`: server-sent event `data:` frames (cloud API)

mod ndjson;
mod sse;

pub use ndjson::NdjsonDecoder;
pub use sse::SseDecoder;

use crate::error::{Error, Result};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

/// Default capacity of a delta channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Incremental decoder for one upstream framing
pub trait StreamDecoder {
    /// Feed raw bytes, get back the text increments completed by them.
    ///
    /// Bytes of an incomplete line or frame stay buffered until a later call
    /// completes them. Malformed frames yield nothing.
    fn push(&mut self, chunk: &[u8]) -> Vec<String>;

    /// True once the upstream signalled the end of the stream
    fn is_done(&self) -> bool {
        false
    }
}

/// Sending half of a text-increment channel
#[derive(Debug, Clone)]
pub struct DeltaSink {
    tx: mpsc::Sender<String>,
}

impl DeltaSink {
    /// Create a bounded sink/receiver pair
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Send one increment. Empty increments are skipped.
    ///
    /// # Errors
    /// Returns [`Error::ClientDisconnected`] when the receiver is gone.
    pub async fn emit(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if text.is_empty() {
            return Ok(());
        }
        self.tx
            .send(text)
            .await
            .map_err(|_| Error::ClientDisconnected)
    }

    /// Whether the receiving side has been dropped
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drive a byte stream through a decoder, emitting every increment as soon as
/// its frame completes. Returns the concatenation of all emitted increments.
///
/// # Errors
/// Fails on a transport error mid-stream or when the client disconnects.
pub async fn relay<S, B, E, D>(body: S, mut decoder: D, sink: &DeltaSink) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    D: StreamDecoder,
{
    let mut body = std::pin::pin!(body);
    let mut full = String::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::Network(format!("stream read failed: {e}")))?;
        for delta in decoder.push(chunk.as_ref()) {
            full.push_str(&delta);
            sink.emit(delta).await?;
        }
        if decoder.is_done() {
            break;
        }
    }

    Ok(full)
}

/// Drain a receiver into one string (test and CLI helper)
pub async fn collect(mut rx: mpsc::Receiver<String>) -> String {
    let mut out = String::new();
    while let Some(part) = rx.recv().await {
        out.push_str(&part);
    }
    out
}
