//! Newline-delimited JSON decoder
//!
//! Each complete line is one JSON object; its `message.content` string is
//! the next increment.

use super::StreamDecoder;
use serde_json::Value;

/// Decoder for the local runtime's chat stream
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_line(line: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(line);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        // Malformed lines are skipped.
        let event: Value = serde_json::from_str(trimmed).ok()?;
        event
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

impl StreamDecoder for NdjsonDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(delta) = Self::decode_line(&line[..pos]) {
                out.push(delta);
            }
        }
        out
    }
}
