//! Ollama - local runtime adapter
//!
//! Posts the window to `/api/chat` with streaming enabled and decodes the
//! newline-delimited JSON reply into text increments.

use crate::error::{Error, Result};
use crate::message::ChatMessage;
use crate::provider::ChatProvider;
use crate::router::Provider;
use crate::stream::{self, DeltaSink, NdjsonDecoder};
use crate::window::ConversationWindow;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default local runtime URL (container service name)
pub const DEFAULT_BASE_URL: &str = "http://local-model:11434";

/// Default local model
pub const DEFAULT_MODEL: &str = "qwen2.5:3b";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: &'a [ChatMessage],
    options: OllamaOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_ctx: u32,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Ollama provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the runtime, without trailing slash
    pub base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Context window size in tokens
    pub num_ctx: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
            top_p: 0.9,
            num_ctx: 4096,
        }
    }
}

impl OllamaConfig {
    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn options(&self) -> OllamaOptions {
        OllamaOptions {
            temperature: self.temperature,
            top_p: self.top_p,
            num_ctx: self.num_ctx,
        }
    }
}

/// Local runtime provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a provider sharing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: OllamaConfig) -> Self {
        Self { client, config }
    }

    /// Check `/api/tags`; succeeds when the runtime answers 2xx within `timeout`.
    pub async fn check_ready(&self, timeout: Duration) -> Result<()> {
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("Ollama error {}", status.as_u16()),
            });
        }
        Ok(())
    }

    fn map_send_error(&self, e: reqwest::Error, timeout: Duration) -> Error {
        if e.is_timeout() {
            Error::Timeout(timeout.as_millis() as u64)
        } else if e.is_connect() {
            Error::Network(format!(
                "failed to connect to local runtime at {}",
                self.config.base_url
            ))
        } else {
            Error::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn kind(&self) -> Provider {
        Provider::Local
    }

    #[instrument(skip(self, window, sink), fields(model = %model, messages = window.len()))]
    async fn stream_chat(
        &self,
        model: &str,
        window: &ConversationWindow,
        sink: &DeltaSink,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.config.base_url);
        let request = OllamaChatRequest {
            model,
            stream: true,
            messages: window.messages(),
            options: self.config.options(),
        };

        debug!("Sending streaming request to Ollama");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, Duration::ZERO))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("Ollama error {}", status.as_u16()),
            });
        }
        if response.content_length() == Some(0) {
            return Err(Error::MissingBody("Ollama".to_string()));
        }

        let body = response.bytes_stream();
        stream::relay(body, NdjsonDecoder::new(), sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::collect;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window() -> ConversationWindow {
        ConversationWindow::build(vec![ChatMessage::user("hi")], 1000, "sys")
    }

    async fn provider_for(server: &MockServer) -> OllamaProvider {
        let config = OllamaConfig::default().with_base_url(server.uri());
        OllamaProvider::new(config).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://local-model:11434");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!((config.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.num_ctx, 4096);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = OllamaConfig::default().with_base_url("http://x:1/");
        assert_eq!(config.base_url, "http://x:1");
    }

    #[tokio::test]
    async fn test_stream_chat_relays_ndjson() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"}}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"}}\n",
            "{\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen2.5:3b",
                "stream": true,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "options": {"num_ctx": 4096}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let (sink, rx) = DeltaSink::channel(16);
        let full = provider
            .stream_chat("qwen2.5:3b", &window(), &sink)
            .await
            .unwrap();
        drop(sink);

        assert_eq!(full, "Hello");
        assert_eq!(collect(rx).await, "Hello");
    }

    #[tokio::test]
    async fn test_stream_chat_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let (sink, _rx) = DeltaSink::channel(4);
        let err = provider
            .stream_chat("m", &window(), &sink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ollama error 500");
    }

    #[tokio::test]
    async fn test_stream_chat_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let (sink, _rx) = DeltaSink::channel(4);
        let err = provider
            .stream_chat("m", &window(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingBody(_)));
    }

    #[tokio::test]
    async fn test_stream_chat_unreachable() {
        let config = OllamaConfig::default().with_base_url("http://127.0.0.1:9");
        let provider = OllamaProvider::new(config).unwrap();
        let (sink, _rx) = DeltaSink::channel(4);
        let err = provider
            .stream_chat("m", &window(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_check_ready() {
        let server = MockServer::start().await;
        let tags = r#"{"models":[]}"#;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string(tags))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        assert!(provider.check_ready(Duration::from_secs(2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_ready_upstream_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider
            .check_ready(Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 503, .. }));
    }
}
