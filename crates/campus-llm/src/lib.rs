//! Campus LLM - routing and streaming upstream access
//!
//! This crate holds everything between a chat request body and the text
//! increments coming back from a model runtime:
//! - Window: message coercion and character-budget trimming
//! - Scorer: additive complexity heuristic over the newest message
//! - Router: score-to-tier route selection with optional cloud escalation
//! - Stream: NDJSON and SSE decoders feeding a delta channel
//! - Ollama: local runtime adapter (`/api/chat`)
//! - OpenAI: cloud responses-API adapter (`/responses`)
//! - Mock: scripted provider for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod router;
pub mod scorer;
pub mod secret;
pub mod stream;
pub mod util;
pub mod window;

pub use error::{Error, Result};
pub use message::ChatMessage;
pub use provider::ChatProvider;
pub use router::{Provider, RouteDecision, RouteSelector, RouteTier, RoutingConfig};
pub use scorer::{analyze, score, ComplexityBreakdown};
pub use secret::ApiKey;
pub use stream::{DeltaSink, StreamDecoder};
pub use window::ConversationWindow;

// Re-export provider types
pub use mock::{MockProvider, MockReply};
pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
