//! Server configuration types
//!
//! Every section has defaults matching `config/default.toml`, so partial
//! files and environment overrides deserialize cleanly.

use campus_core::{Mode, PipelineConfig};
use campus_llm::{ApiKey, OllamaConfig, OpenAiConfig, RoutingConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the readiness check
const READY_CHECK_CAP: Duration = Duration::from_millis(4000);

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: Mode,
    pub server: ServerConfig,
    pub local: LocalConfig,
    pub cloud: CloudConfig,
    pub routing: RoutingSection,
    pub chat: ChatConfig,
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body ceiling in bytes
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            body_limit: campus_core::pipeline::DEFAULT_BODY_LIMIT,
        }
    }
}

/// Local runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub base_url: String,
    /// Default model, also used for unset tiers
    pub model: String,
    pub fast_model: String,
    pub balanced_model: String,
    pub quality_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub num_ctx: u32,
}

impl Default for LocalConfig {
    fn default() -> Self {
        let ollama = OllamaConfig::default();
        Self {
            base_url: ollama.base_url,
            model: campus_llm::ollama::DEFAULT_MODEL.to_string(),
            fast_model: String::new(),
            balanced_model: String::new(),
            quality_model: String::new(),
            temperature: ollama.temperature,
            top_p: ollama.top_p,
            num_ctx: ollama.num_ctx,
        }
    }
}

impl LocalConfig {
    fn tier_model(&self, tier: &str) -> String {
        if tier.trim().is_empty() {
            self.model.clone()
        } else {
            tier.to_string()
        }
    }

    /// Model for the fast tier
    pub fn fast(&self) -> String {
        self.tier_model(&self.fast_model)
    }

    /// Model for the balanced tier
    pub fn balanced(&self) -> String {
        self.tier_model(&self.balanced_model)
    }

    /// Model for the quality tier
    pub fn quality(&self) -> String {
        self.tier_model(&self.quality_model)
    }
}

/// Cloud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: ApiKey,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: campus_llm::openai::DEFAULT_BASE_URL.to_string(),
            model: campus_llm::openai::DEFAULT_MODEL.to_string(),
            api_key: ApiKey::default(),
        }
    }
}

/// Routing toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    pub smart: bool,
    pub cloud_escalation: bool,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            smart: true,
            cloud_escalation: false,
        }
    }
}

/// Chat request handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub max_input_chars: usize,
    pub system_prompt: String,
    pub fallback_word_delay_ms: u64,
    pub replay_word_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_input_chars: campus_core::pipeline::DEFAULT_MAX_INPUT_CHARS,
            system_prompt: campus_core::DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback_word_delay_ms: 16,
            replay_word_delay_ms: 8,
        }
    }
}

/// Response cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub max_value_chars: usize,
    pub key_prefix_chars: usize,
    /// 0 disables expiry
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: campus_core::cache::DEFAULT_CAPACITY,
            max_value_chars: campus_core::cache::DEFAULT_MAX_VALUE_CHARS,
            key_prefix_chars: campus_core::cache::DEFAULT_KEY_PREFIX_CHARS,
            ttl_secs: 0,
        }
    }
}

/// Upstream call limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// 0 waits indefinitely
    pub timeout_ms: u64,
}

impl AppConfig {
    /// Model reported by `/health` and `/api/ai/report`
    pub fn active_model(&self) -> &str {
        match self.mode {
            Mode::Local => &self.local.model,
            Mode::Cloud => &self.cloud.model,
        }
    }

    /// Inputs of the route selector
    pub fn routing_config(&self) -> RoutingConfig {
        RoutingConfig {
            smart_routing: self.routing.smart,
            cloud_escalation: self.routing.cloud_escalation,
            cloud_credential: !self.cloud.api_key.is_empty(),
            default_model: self.local.model.clone(),
            fast_model: self.local.fast(),
            balanced_model: self.local.balanced(),
            quality_model: self.local.quality(),
            cloud_model: self.cloud.model.clone(),
        }
    }

    /// Local adapter settings
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            temperature: self.local.temperature,
            top_p: self.local.top_p,
            num_ctx: self.local.num_ctx,
            ..OllamaConfig::default()
        }
        .with_base_url(self.local.base_url.clone())
    }

    /// Cloud adapter settings
    pub fn openai_config(&self) -> OpenAiConfig {
        let base = self.cloud.base_url.clone();
        let key = self.cloud.api_key.clone();
        OpenAiConfig::new(base).with_api_key(key)
    }

    /// Optional bound on one upstream call
    pub fn upstream_timeout(&self) -> Option<Duration> {
        let millis = self.upstream.timeout_ms;
        (millis > 0).then(|| Duration::from_millis(millis))
    }

    /// Bound on the readiness check: the upstream timeout, capped at 4 s
    pub fn ready_timeout(&self) -> Duration {
        self.upstream_timeout()
            .map_or(READY_CHECK_CAP, |t| t.min(READY_CHECK_CAP))
    }

    /// Chat pipeline settings
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            mode: self.mode,
            max_input_chars: self.chat.max_input_chars,
            system_prompt: self.chat.system_prompt.clone(),
            cloud_model: self.cloud.model.clone(),
            body_limit: self.server.body_limit,
            cache_max_value_chars: self.cache.max_value_chars,
            cache_key_prefix_chars: self.cache.key_prefix_chars,
            fallback_delay: Duration::from_millis(self.chat.fallback_word_delay_ms),
            replay_delay: Duration::from_millis(self.chat.replay_word_delay_ms),
            upstream_timeout: self.upstream_timeout(),
        }
    }

    /// Optional cache expiry
    pub fn cache_ttl(&self) -> Option<Duration> {
        let secs = self.cache.ttl_secs;
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}
