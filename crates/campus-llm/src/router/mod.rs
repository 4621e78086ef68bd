//! Router - provider and model selection
//!
//! Turns a conversation into a [`RouteDecision`]: which upstream runtime
//! (local or cloud) and which model should answer it.
//!
//! # Module Structure
//!
//! - `types`: RouteDecision, Provider, RouteTier
//! - `config`: RoutingConfig (tier models, toggles, credential presence)
//! - `selector`: RouteSelector, the score-to-tier state machine

mod config;
mod selector;
mod types;


pub use config::RoutingConfig;
pub use selector::{RouteSelector, BALANCED_THRESHOLD, ESCALATION_THRESHOLD, QUALITY_THRESHOLD};
pub use types::{Provider, RouteDecision, RouteTier};
