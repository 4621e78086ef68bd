//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat, Value};
use std::collections::HashMap;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Flat variable names and the config keys they override
const LEGACY_ENV: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("MODE", "mode"),
    ("LOCAL_MODEL_BASE_URL", "local.base_url"),
    ("OLLAMA_MODEL", "local.model"),
    ("LOCAL_MODEL_FAST", "local.fast_model"),
    ("LOCAL_MODEL_BALANCED", "local.balanced_model"),
    ("LOCAL_MODEL_QUALITY", "local.quality_model"),
    ("LOCAL_TEMPERATURE", "local.temperature"),
    ("LOCAL_TOP_P", "local.top_p"),
    ("LOCAL_NUM_CTX", "local.num_ctx"),
    ("CLOUD_API_BASE_URL", "cloud.base_url"),
    ("CLOUD_MODEL", "cloud.model"),
    ("CLOUD_API_KEY", "cloud.api_key"),
    ("SMART_ROUTING", "routing.smart"),
    ("CLOUD_ESCALATION", "routing.cloud_escalation"),
    ("MAX_INPUT_CHARS", "chat.max_input_chars"),
    ("QUALITY_SYSTEM_PROMPT", "chat.system_prompt"),
    ("RESPONSE_CACHE_SIZE", "cache.capacity"),
    ("RESPONSE_CACHE_TTL_SECONDS", "cache.ttl_secs"),
    ("UPSTREAM_TIMEOUT_MS", "upstream.timeout_ms"),
];

/// Load configuration from files and the process environment
pub fn load_config() -> Result<AppConfig> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    load_config_from(&vars)
}

/// Load configuration using `vars` in place of the process environment
pub fn load_config_from(vars: &HashMap<String, String>) -> Result<AppConfig> {
    let env_name = vars
        .get("CAMPUS_ENV")
        .cloned()
        .unwrap_or_else(|| "development".to_string());

    let env_file = format!("config/{env_name}");
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&env_file).required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Prefixed environment variables: CAMPUS_CACHE__CAPACITY=200
        .add_source(
            Environment::with_prefix("CAMPUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

    // 4. Flat variable names (highest priority)
    for (var, key) in LEGACY_ENV {
        if let Some(value) = legacy_value(var, vars) {
            builder = builder
                .set_override(*key, value)
                .with_context(|| format!("Invalid override from {var}"))?;
        }
    }

    builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Empty values count as unset. Toggles are on only for a literal "true".
fn legacy_value(var: &str, vars: &HashMap<String, String>) -> Option<Value> {
    let raw = vars.get(var)?.trim();
    if raw.is_empty() {
        return None;
    }
    let value = match var {
        "SMART_ROUTING" | "CLOUD_ESCALATION" => Value::from(raw.eq_ignore_ascii_case("true")),
        "MODE" => Value::from(raw.to_lowercase()),
        _ => Value::from(raw),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::Mode;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_embedded_defaults() {
        let config = load_config_from(&HashMap::new()).unwrap();
        assert_eq!(config.mode, Mode::Local);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.local.base_url, "http://local-model:11434");
        assert_eq!(config.local.model, "qwen2.5:3b");
        assert_eq!(config.cloud.model, "gpt-4.1-mini");
        assert!(config.routing.smart);
        assert!(!config.routing.cloud_escalation);
        assert_eq!(config.chat.max_input_chars, 12_000);
        assert_eq!(config.cache.capacity, 120);
        assert_eq!(config.upstream.timeout_ms, 0);
        assert!(config.chat.system_prompt.starts_with("You are a precise"));
    }

    #[test]
    fn test_legacy_variables_override() {
        let config = load_config_from(&vars(&[
            ("PORT", "9100"),
            ("MODE", "CLOUD"),
            ("OLLAMA_MODEL", "llama3.2"),
            ("CLOUD_API_KEY", "sk-test-abcdef123456"),
            ("SMART_ROUTING", "no"),
            ("CLOUD_ESCALATION", "TRUE"),
            ("RESPONSE_CACHE_SIZE", "10"),
            ("LOCAL_TOP_P", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.mode, Mode::Cloud);
        assert_eq!(config.local.model, "llama3.2");
        assert_eq!(config.cloud.api_key.expose_secret(), "sk-test-abcdef123456");
        assert!(!config.routing.smart);
        assert!(config.routing.cloud_escalation);
        assert_eq!(config.cache.capacity, 10);
        assert!((config.local.top_p - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_prefixed_variables_and_precedence() {
        let config = load_config_from(&vars(&[
            ("CAMPUS_CACHE__CAPACITY", "42"),
            ("CAMPUS_LOCAL__MODEL", "from-prefixed"),
            ("OLLAMA_MODEL", "from-flat"),
        ]))
        .unwrap();

        assert_eq!(config.cache.capacity, 42);
        assert_eq!(config.local.model, "from-flat");
    }

    #[test]
    fn test_empty_legacy_values_ignored() {
        let env = vars(&[("OLLAMA_MODEL", ""), ("PORT", " ")]);
        let config = load_config_from(&env).unwrap();
        assert_eq!(config.local.model, "qwen2.5:3b");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(load_config_from(&vars(&[("MODE", "hybrid")])).is_err());
    }
}
