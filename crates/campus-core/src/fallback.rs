//! Fallback streamer
//!
//! Writes a message one word at a time at a fixed cadence. Used both for the
//! degraded answer after an upstream failure and for cache replays.

use campus_llm::{DeltaSink, Result};
use std::fmt::Display;
use std::time::Duration;

/// Pause after each word of a fallback answer
pub const FALLBACK_WORD_DELAY: Duration = Duration::from_millis(16);

/// Pause after each word of a cache replay
pub const REPLAY_WORD_DELAY: Duration = Duration::from_millis(8);

/// The degraded answer shown when generation fails.
#[must_use]
pub fn fallback_message(error: &impl Display) -> String {
    let mut reason = error.to_string();
    if reason.trim().is_empty() {
        reason = "temporary backend issue".to_string();
    }
    format!(
        "Runtime fallback response: {reason}. \
         Infrastructure is running; model path can be retried automatically."
    )
}

/// Stream `text` split on single spaces, each word followed by one space,
/// sleeping `delay` after every word.
///
/// # Errors
/// Stops with [`campus_llm::Error::ClientDisconnected`] once the reader is gone.
pub async fn stream_words(text: &str, delay: Duration, sink: &DeltaSink) -> Result<()> {
    for word in text.split(' ') {
        sink.emit(format!("{word} ")).await?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_llm::stream::collect;

    #[test]
    fn test_fallback_message_text() {
        assert_eq!(
            fallback_message(&"CLOUD_API_KEY not set"),
            "Runtime fallback response: CLOUD_API_KEY not set. \
             Infrastructure is running; model path can be retried automatically."
        );
        assert!(fallback_message(&"").contains("temporary backend issue"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_words_appends_space_per_word() {
        let (sink, rx) = DeltaSink::channel(16);
        let words = stream_words("a b  c", REPLAY_WORD_DELAY, &sink);
        words.await.unwrap();
        drop(sink);
        // the empty word between the double space becomes a lone space
        assert_eq!(collect(rx).await, "a b  c ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_words_paces_each_word() {
        let (sink, mut rx) = DeltaSink::channel(16);
        let start = tokio::time::Instant::now();
        let text = "one two three";
        let writer = tokio::spawn(async move {
            stream_words(text, FALLBACK_WORD_DELAY, &sink).await
        });

        let mut words = Vec::new();
        while let Some(word) = rx.recv().await {
            words.push(word);
        }
        writer.await.unwrap().unwrap();

        assert_eq!(words, vec!["one ", "two ", "three "]);
        assert!(start.elapsed() >= FALLBACK_WORD_DELAY * 3);
    }

    #[tokio::test]
    async fn test_stream_words_stops_on_disconnect() {
        let (sink, rx) = DeltaSink::channel(1);
        drop(rx);
        assert!(stream_words("x y", Duration::ZERO, &sink).await.is_err());
    }
}
