//! OpenAI - cloud "responses" API adapter
//!
//! Posts the window to `/responses` with streaming enabled and decodes the
//! server-sent event reply, keeping only output-text delta events.

use crate::error::{Error, Result};
use crate::message::ChatMessage;
use crate::provider::ChatProvider;
use crate::router::Provider;
use crate::secret::ApiKey;
use crate::stream::{self, DeltaSink, SseDecoder};
use crate::util::truncate_chars;
use crate::window::ConversationWindow;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Default cloud API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default cloud model
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Longest upstream error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

const MISSING_KEY: &str = "CLOUD_API_KEY not set";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: [InputText<'a>; 1],
}

#[derive(Debug, Serialize)]
struct InputText<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl<'a> From<&'a ChatMessage> for InputMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: &message.role,
            content: [InputText {
                kind: "input_text",
                text: &message.content,
            }],
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Cloud provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Bearer credential; cloud calls fail before any network I/O without it
    pub api_key: Option<ApiKey>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl OpenAiConfig {
    /// Create a configuration for `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Set the API key; blank keys count as absent
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<ApiKey>) -> Self {
        let key = key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Whether a usable credential is configured
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

/// Cloud responses-API provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create a new cloud provider
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a provider sharing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    fn send_error(&self, error: reqwest::Error) -> Error {
        if error.is_connect() {
            let base = &self.config.base_url;
            Error::Network(format!("failed to connect to cloud API at {base}"))
        } else {
            Error::Network(error.to_string())
        }
    }
}

fn error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("Cloud error {status}")
    } else {
        truncate_chars(body, MAX_ERROR_BODY_CHARS).to_string()
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> Provider {
        Provider::Cloud
    }

    #[instrument(skip(self, window, sink), fields(model = %model, messages = window.len()))]
    async fn stream_chat(
        &self,
        model: &str,
        window: &ConversationWindow,
        sink: &DeltaSink,
    ) -> Result<String> {
        let key = self
            .config
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::NotConfigured(MISSING_KEY.to_string()))?;

        let url = format!("{}/responses", self.config.base_url);
        let request = ResponsesRequest {
            model,
            input: window.messages().iter().map(InputMessage::from).collect(),
            stream: true,
        };

        debug!("Sending streaming request to cloud API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Cloud API returned an error");
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }
        if response.content_length() == Some(0) {
            return Err(Error::MissingBody("Cloud API".to_string()));
        }

        let body = response.bytes_stream();
        stream::relay(body, SseDecoder::new(), sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::collect;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window() -> ConversationWindow {
        ConversationWindow::build(vec![ChatMessage::user("hi")], 1000, "sys")
    }

    const TEST_KEY: &str = "sk-test-1234567890";

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        let config = OpenAiConfig::new(server.uri()).with_api_key(TEST_KEY);
        OpenAiProvider::new(config).unwrap()
    }

    #[test]
    fn test_input_message_shape() {
        let message = ChatMessage::user("hello");
        let json = serde_json::to_value(InputMessage::from(&message)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "content": [{"type": "input_text", "text": "hello"}]
            })
        );
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message(502, "  "), "Cloud error 502");
        assert_eq!(error_message(401, "bad key"), "bad key");
        assert_eq!(error_message(400, &"e".repeat(1000)).len(), 300);
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = OpenAiConfig::new("http://x").with_api_key("  ");
        assert!(config.api_key.is_none());
        assert!(!config.has_credential());
        let base = OpenAiConfig::new("http://x");
        let debug = format!("{:?}", base.with_api_key("sk-abcdefghijkl"));
        assert!(!debug.contains("efghij"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = OpenAiConfig::new(server.uri());
        let provider = OpenAiProvider::new(config).unwrap();
        let (sink, _rx) = DeltaSink::channel(4);
        let err = provider
            .stream_chat("m", &window(), &sink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "CLOUD_API_KEY not set");
    }

    #[tokio::test]
    async fn test_stream_chat_relays_text_deltas() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: response.created\n",
            "data: {\"type\":\"response.created\"}\n\n",
            "data: {\"type\":\"response.output_text.delta\",\"delta\":\"Hi \"}\n\n",
            "data: {\"type\":\"response.output_text.delta\",\"delta\":\"there\"}\n\n",
            "data: {\"type\":\"response.completed\"}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer sk-test-1234567890"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4.1-mini",
                "stream": true,
                "input": [
                    {"role": "system", "content": [{"type": "input_text", "text": "sys"}]},
                    {"role": "user", "content": [{"type": "input_text", "text": "hi"}]}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let (sink, rx) = DeltaSink::channel(16);
        let full = provider
            .stream_chat("gpt-4.1-mini", &window(), &sink)
            .await
            .unwrap();
        drop(sink);

        assert_eq!(full, "Hi there");
        assert_eq!(collect(rx).await, "Hi there");
    }

    #[tokio::test]
    async fn test_stream_chat_carries_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let (sink, _rx) = DeltaSink::channel(4);
        let err = provider
            .stream_chat("m", &window(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 429, .. }));
        assert_eq!(err.to_string(), "rate limited");
    }

    #[tokio::test]
    async fn test_stream_chat_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let (sink, _rx) = DeltaSink::channel(4);
        let err = provider
            .stream_chat("m", &window(), &sink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cloud error 503");
    }
}
