//! Server-sent events decoder
//!
//! Frames are separated by a blank line. Within a frame every `data:` line
//! carries a JSON payload; `response.output_text.delta` payloads with a
//! non-empty `delta` are increments and `[DONE]` ends the stream.

use super::StreamDecoder;
use serde_json::Value;

const FRAME_SEPARATOR: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";
const TEXT_DELTA_EVENT: &str = "response.output_text.delta";

/// Decoder for the cloud "responses" event stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_frame(&mut self, frame: &[u8], out: &mut Vec<String>) {
        let text = String::from_utf8_lossy(frame);
        for line in text.split('\n') {
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == DONE_MARKER {
                self.done = true;
                return;
            }
            let Ok(event) = serde_json::from_str::<Value>(payload) else {
                continue;
            };
            if event.get("type").and_then(Value::as_str) != Some(TEXT_DELTA_EVENT) {
                continue;
            }
            if let Some(delta) = event
                .get("delta")
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
            {
                out.push(delta.to_string());
            }
        }
    }
}

impl StreamDecoder for SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self
            .buffer
            .windows(FRAME_SEPARATOR.len())
            .position(|w| w == FRAME_SEPARATOR)
        {
            let frame: Vec<u8> = self.buffer.drain(..pos + FRAME_SEPARATOR.len()).collect();
            self.decode_frame(&frame[..pos], &mut out);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        out
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
