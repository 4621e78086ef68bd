//! Chat pipeline
//!
//! The `/api/chat` state machine without any HTTP types:
//!
//! `received -> windowed -> routed -> cache-check -> {replay | generate} -> done`
//!
//! with `error -> fallback -> done` reachable from every step. Work is split
//! in two so the caller can send response headers between them:
//! [`ChatPipeline::prepare`] runs everything up to the cache lookup
//! synchronously, [`ChatPipeline::execute`] streams the answer.

use crate::cache::{ResponseCache, DEFAULT_KEY_PREFIX_CHARS, DEFAULT_MAX_VALUE_CHARS};
use crate::error::{Error, Result};
use crate::fallback::{self, FALLBACK_WORD_DELAY, REPLAY_WORD_DELAY};
use crate::state::ServerState;
use campus_llm::{
    ChatProvider, ConversationWindow, DeltaSink, Provider, RouteDecision, RouteSelector,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Instruction prepended to every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a precise, practical assistant. \
Prioritize correctness over verbosity. When uncertain, clearly state assumptions. \
For technical tasks, give structured answers with actionable steps. \
Avoid filler and avoid hallucinated facts.";

/// Largest accepted request body in bytes
pub const DEFAULT_BODY_LIMIT: usize = 1_000_000;

/// Default character budget of a conversation window
pub const DEFAULT_MAX_INPUT_CHARS: usize = 12_000;

/// Global operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Score-based routing over the local runtime
    #[default]
    Local,
    /// Every chat goes to the cloud model
    Cloud,
}

impl Mode {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline tunables
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Forced-cloud or score-routed
    pub mode: Mode,
    /// Window character budget
    pub max_input_chars: usize,
    /// Synthesized system instruction
    pub system_prompt: String,
    /// Model used in forced-cloud mode
    pub cloud_model: String,
    /// Request body ceiling in bytes
    pub body_limit: usize,
    /// Answers must be shorter than this to be cached
    pub cache_max_value_chars: usize,
    /// Latest-message chars used in cache keys
    pub cache_key_prefix_chars: usize,
    /// Word pause for fallback answers
    pub fallback_delay: Duration,
    /// Word pause for cache replays
    pub replay_delay: Duration,
    /// Bound on one upstream call; `None` waits indefinitely
    pub upstream_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Local,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            cloud_model: campus_llm::openai::DEFAULT_MODEL.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            cache_max_value_chars: DEFAULT_MAX_VALUE_CHARS,
            cache_key_prefix_chars: DEFAULT_KEY_PREFIX_CHARS,
            fallback_delay: FALLBACK_WORD_DELAY,
            replay_delay: REPLAY_WORD_DELAY,
            upstream_timeout: None,
        }
    }
}

/// Whether an answer came from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Replayed from cache
    Hit,
    /// Generated (or failed) without cache
    Miss,
}

impl CacheStatus {
    /// Header value
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

/// How a chat request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Cached answer replayed
    Replayed,
    /// Upstream answer relayed
    Generated,
    /// Degraded answer streamed after an error
    Fallback,
    /// Client went away before the answer finished
    Disconnected,
}

#[derive(Debug)]
enum Step {
    Replay {
        text: String,
    },
    Generate {
        window: ConversationWindow,
        cache_key: Option<String>,
    },
    Fail {
        error: Error,
    },
}

/// Result of [`ChatPipeline::prepare`]; consumed by [`ChatPipeline::execute`]
#[derive(Debug)]
pub struct ChatPlan {
    request_id: Uuid,
    decision: Option<RouteDecision>,
    step: Step,
}

impl ChatPlan {
    /// Correlation id for logs
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Routing decision, absent when the body could not be parsed
    #[must_use]
    pub fn decision(&self) -> Option<&RouteDecision> {
        self.decision.as_ref()
    }

    /// Cache outcome of the lookup
    #[must_use]
    pub fn cache_status(&self) -> CacheStatus {
        match self.step {
            Step::Replay { .. } => CacheStatus::Hit,
            _ => CacheStatus::Miss,
        }
    }
}

/// Composes window building, routing, caching, relay and fallback
pub struct ChatPipeline {
    config: PipelineConfig,
    selector: RouteSelector,
    local: Arc<dyn ChatProvider>,
    cloud: Arc<dyn ChatProvider>,
    state: Arc<ServerState>,
}

impl ChatPipeline {
    /// Create a pipeline over two provider adapters and shared state
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        selector: RouteSelector,
        local: Arc<dyn ChatProvider>,
        cloud: Arc<dyn ChatProvider>,
        state: Arc<ServerState>,
    ) -> Self {
        Self {
            config,
            selector,
            local,
            cloud,
            state,
        }
    }

    /// Shared state
    #[must_use]
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Build the window for a parsed body and route it, honoring forced-cloud
    /// mode. Does not touch shared state.
    #[must_use]
    pub fn route(&self, body: &Value) -> (ConversationWindow, RouteDecision) {
        let raw = body.get("messages").unwrap_or(&Value::Null);
        let window = ConversationWindow::from_json(
            raw,
            self.config.max_input_chars,
            &self.config.system_prompt,
        );
        let decision = match self.config.mode {
            Mode::Cloud => RouteDecision::forced_cloud(self.config.cloud_model.clone()),
            Mode::Local => self.selector.select(&window),
        };
        (window, decision)
    }

    /// Parse the body, record audit state, route, and look up the cache.
    ///
    /// `body` is the raw request body, or the error the transport layer hit
    /// while reading it.
    pub fn prepare(&self, body: Result<&[u8]>) -> ChatPlan {
        let request_id = Uuid::new_v4();
        self.state.metrics().record_chat();

        let parsed = match body.and_then(|bytes| parse_body(bytes, self.config.body_limit)) {
            Ok(value) => value,
            Err(error) => {
                warn!(%request_id, %error, "rejecting chat body");
                return ChatPlan {
                    request_id,
                    decision: None,
                    step: Step::Fail { error },
                };
            }
        };

        let (window, decision) = self.route(&parsed);
        self.state.record_query(window.latest_content());
        self.state.record_route(&decision);

        info!(
            %request_id,
            provider = %decision.provider,
            model = %decision.model,
            tier = %decision.tier,
            reason = %decision.reason,
            messages = window.len(),
            "chat routed"
        );

        let cache_key = ResponseCache::key(
            &decision.model,
            window.latest_content(),
            self.config.cache_key_prefix_chars,
        );
        let cached = cache_key.as_deref().and_then(|k| self.state.cache_get(k));
        self.state.metrics().record_cache(cached.is_some());

        let step = match cached {
            Some(text) => {
                debug!(%request_id, "cache hit");
                Step::Replay { text }
            }
            None => Step::Generate { window, cache_key },
        };

        ChatPlan {
            request_id,
            decision: Some(decision),
            step,
        }
    }

    /// Stream the answer for a prepared plan into `sink`.
    #[instrument(skip_all, fields(request_id = %plan.request_id))]
    pub async fn execute(&self, plan: ChatPlan, sink: DeltaSink) -> ChatOutcome {
        let ChatPlan { decision, step, .. } = plan;

        let failure = match (step, decision) {
            (Step::Replay { text }, _) => {
                let delay = self.config.replay_delay;
                return match fallback::stream_words(&text, delay, &sink).await {
                    Ok(()) => ChatOutcome::Replayed,
                    Err(_) => ChatOutcome::Disconnected,
                };
            }
            (Step::Generate { window, cache_key }, Some(decision)) => {
                match self.generate(&decision, &window, &sink).await {
                    Ok(text) => {
                        self.store(cache_key, text);
                        return ChatOutcome::Generated;
                    }
                    Err(error) => error,
                }
            }
            (Step::Generate { .. }, None) => Error::InvalidBody,
            (Step::Fail { error }, _) => error,
        };

        if failure.is_disconnect() {
            debug!("client disconnected mid-stream");
            return ChatOutcome::Disconnected;
        }

        warn!(error = %failure, "chat generation failed, streaming fallback");
        self.state.metrics().record_fallback();
        let message = fallback::fallback_message(&failure);
        let delay = self.config.fallback_delay;
        match fallback::stream_words(&message, delay, &sink).await {
            Ok(()) => ChatOutcome::Fallback,
            Err(_) => ChatOutcome::Disconnected,
        }
    }

    async fn generate(
        &self,
        decision: &RouteDecision,
        window: &ConversationWindow,
        sink: &DeltaSink,
    ) -> Result<String> {
        let provider = self.provider_for(decision.provider)?;
        debug!(provider = provider.name(), "calling upstream");

        let call = provider.stream_chat(&decision.model, window, sink);
        let Some(limit) = self.config.upstream_timeout else {
            return Ok(call.await?);
        };
        match tokio::time::timeout(limit, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                let millis = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                Err(campus_llm::Error::Timeout(millis).into())
            }
        }
    }

    /// Adapter serving `kind`
    fn provider_for(&self, kind: Provider) -> Result<&Arc<dyn ChatProvider>> {
        [&self.local, &self.cloud]
            .into_iter()
            .find(|p| p.kind() == kind)
            .ok_or_else(|| {
                let reason = format!("no {kind} adapter configured");
                campus_llm::Error::NotConfigured(reason).into()
            })
    }

    fn store(&self, cache_key: Option<String>, text: String) {
        let Some(key) = cache_key else {
            return;
        };
        if text.chars().count() < self.config.cache_max_value_chars {
            self.state.cache_put(key, text);
        }
    }
}

/// Decode a chat body. An empty body counts as `{}`.
pub fn parse_body(bytes: &[u8], limit: usize) -> Result<Value> {
    if bytes.len() > limit {
        return Err(Error::BodyTooLarge);
    }
    if bytes.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(bytes).or(Err(Error::InvalidBody))
}

#[cfg(test)]
mod tests;
