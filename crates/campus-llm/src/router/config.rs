//! Routing configuration

use serde::{Deserialize, Serialize};

/// Static inputs of the route selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Score-based tiering; when off every request uses `default_model`
    pub smart_routing: bool,
    /// Allow very complex requests to go to the cloud
    pub cloud_escalation: bool,
    /// Whether a cloud credential is configured
    pub cloud_credential: bool,
    /// Local model when smart routing is disabled
    pub default_model: String,
    /// Local model for the fast tier
    pub fast_model: String,
    /// Local model for the balanced tier
    pub balanced_model: String,
    /// Local model for the quality tier
    pub quality_model: String,
    /// Cloud model for escalations
    pub cloud_model: String,
}

impl RoutingConfig {
    /// All tiers on one local model, smart routing on, no escalation
    #[must_use]
    pub fn single_model(local_model: impl Into<String>, cloud_model: impl Into<String>) -> Self {
        let local_model = local_model.into();
        Self {
            smart_routing: true,
            cloud_escalation: false,
            cloud_credential: false,
            default_model: local_model.clone(),
            fast_model: local_model.clone(),
            balanced_model: local_model.clone(),
            quality_model: local_model,
            cloud_model: cloud_model.into(),
        }
    }

    /// Escalation needs the toggle and a credential
    #[must_use]
    pub fn can_escalate(&self) -> bool {
        self.cloud_escalation && self.cloud_credential
    }
}
