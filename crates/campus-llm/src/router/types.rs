//! Core routing types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream runtime family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Locally hosted runtime (NDJSON streaming chat endpoint)
    Local,
    /// Cloud inference API (server-sent events)
    Cloud,
}

impl Provider {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named tier a decision lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteTier {
    /// Smart routing disabled, default local model
    Default,
    /// Low complexity, fast local model
    Fast,
    /// Medium complexity, balanced local model
    Balanced,
    /// High complexity, quality local model
    Quality,
    /// Very high complexity escalated to the cloud
    Escalated,
    /// Global cloud mode, selector bypassed
    ForcedCloud,
}

impl RouteTier {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Quality => "quality",
            Self::Escalated => "escalated",
            Self::ForcedCloud => "forced-cloud",
        }
    }
}

impl fmt::Display for RouteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing one chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Which adapter serves the request
    pub provider: Provider,
    /// Model identifier sent upstream (also part of the cache key)
    pub model: String,
    /// Tier label
    pub tier: RouteTier,
    /// Why the tier was chosen (`complexity=<n>`, `smart-routing-disabled`, `mode=cloud`)
    pub reason: String,
}

impl RouteDecision {
    /// Decision used when global cloud mode overrides the selector
    #[must_use]
    pub fn forced_cloud(model: impl Into<String>) -> Self {
        Self {
            provider: Provider::Cloud,
            model: model.into(),
            tier: RouteTier::ForcedCloud,
            reason: "mode=cloud".to_string(),
        }
    }

    /// Audit string, `provider:model:tier:reason`
    #[must_use]
    pub fn audit_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.provider, self.model, self.tier, self.reason
        )
    }
}
