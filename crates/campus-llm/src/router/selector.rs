//! Route selector
//!
//! One decision point per request:
//!
//! 1. smart routing off -> default local model
//! 2. score >= 10 with escalation enabled and a credential -> cloud
//! 3. score >= 8 -> quality, score >= 4 -> balanced, otherwise fast

use super::config::RoutingConfig;
use super::types::{Provider, RouteDecision, RouteTier};
use crate::scorer;
use crate::window::ConversationWindow;
use tracing::debug;

/// Minimum score for cloud escalation
pub const ESCALATION_THRESHOLD: u32 = 10;
/// Minimum score for the quality tier
pub const QUALITY_THRESHOLD: u32 = 8;
/// Minimum score for the balanced tier
pub const BALANCED_THRESHOLD: u32 = 4;

/// Maps complexity scores to route decisions
#[derive(Debug, Clone)]
pub struct RouteSelector {
    config: RoutingConfig,
}

impl RouteSelector {
    /// Create a selector over a static configuration
    #[must_use]
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Route a conversation window
    #[must_use]
    pub fn select(&self, window: &ConversationWindow) -> RouteDecision {
        if !self.config.smart_routing {
            return self.disabled();
        }
        let score = scorer::score(window);
        let decision = self.for_score(score);
        debug!(score, tier = %decision.tier, model = %decision.model, "route selected");
        decision
    }

    /// Route a precomputed score. Pure in (score, config).
    #[must_use]
    pub fn for_score(&self, score: u32) -> RouteDecision {
        if !self.config.smart_routing {
            return self.disabled();
        }

        let config = &self.config;
        let escalate = score >= ESCALATION_THRESHOLD && config.can_escalate();
        let (provider, model, tier) = if escalate {
            (Provider::Cloud, &config.cloud_model, RouteTier::Escalated)
        } else if score >= QUALITY_THRESHOLD {
            (Provider::Local, &config.quality_model, RouteTier::Quality)
        } else if score >= BALANCED_THRESHOLD {
            (Provider::Local, &config.balanced_model, RouteTier::Balanced)
        } else {
            (Provider::Local, &config.fast_model, RouteTier::Fast)
        };

        RouteDecision {
            provider,
            model: model.clone(),
            tier,
            reason: format!("complexity={score}"),
        }
    }

    fn disabled(&self) -> RouteDecision {
        RouteDecision {
            provider: Provider::Local,
            model: self.config.default_model.clone(),
            tier: RouteTier::Default,
            reason: "smart-routing-disabled".to_string(),
        }
    }
}
