//! Configuration validation
//!
//! Hard limits fail startup; deployment smells are logged.

use super::config::AppConfig;
use anyhow::{bail, Result};
use campus_core::Mode;
use tracing::warn;

/// Smallest accepted window budget
const MIN_INPUT_CHARS: usize = 1000;

/// Smallest non-zero upstream timeout
const MIN_TIMEOUT_MS: u64 = 1000;

/// Reject configurations the server cannot run with
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.server.port == 0 {
        bail!("server.port (PORT) must be greater than 0");
    }
    if config.chat.max_input_chars < MIN_INPUT_CHARS {
        bail!(
            "chat.max_input_chars (MAX_INPUT_CHARS) must be at least {MIN_INPUT_CHARS}, got {}",
            config.chat.max_input_chars
        );
    }
    if config.cache.capacity == 0 {
        bail!("cache.capacity (RESPONSE_CACHE_SIZE) must be positive");
    }
    if config.upstream.timeout_ms != 0 && config.upstream.timeout_ms < MIN_TIMEOUT_MS {
        bail!(
            "upstream.timeout_ms (UPSTREAM_TIMEOUT_MS) must be 0 or >= {MIN_TIMEOUT_MS}, got {}",
            config.upstream.timeout_ms
        );
    }
    if config.server.body_limit == 0 {
        bail!("server.body_limit must be greater than 0");
    }
    Ok(())
}

/// Warn about settings that work but are probably unintended
pub fn warn_on_risky_config(config: &AppConfig) {
    let is_production = std::env::var("CAMPUS_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if is_production && config.server.host == "0.0.0.0" {
        warn!(
            "Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 behind a reverse proxy."
        );
    }

    if config.mode == Mode::Cloud && config.cloud.api_key.is_empty() {
        warn!(
            "Cloud mode is configured but CLOUD_API_KEY is missing; every chat will fall back"
        );
    }

    if config.routing.cloud_escalation && config.cloud.api_key.is_empty() {
        warn!(
            "Cloud escalation is enabled but CLOUD_API_KEY is missing; escalation is inactive"
        );
    }
}
