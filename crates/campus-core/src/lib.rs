//! Campus Core - chat request orchestration
//!
//! This crate provides the stateful half of the proxy:
//! - Cache: insertion-ordered bounded response cache
//! - State: audit fields, cache and runtime counters shared by handlers
//! - Fallback: word-paced streaming of degraded and cached answers
//! - Pipeline: the chat state machine tying routing, cache and relay together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod state;

pub use cache::ResponseCache;
pub use error::{Error, Result};
pub use pipeline::{
    CacheStatus, ChatOutcome, ChatPipeline, ChatPlan, Mode, PipelineConfig, DEFAULT_SYSTEM_PROMPT,
};
pub use state::{MetricsSnapshot, RuntimeMetrics, ServerState};
