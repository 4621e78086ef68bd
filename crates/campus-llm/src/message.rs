//! Message types for chat conversations
//!
//! Roles are kept as plain strings: whatever role the client sends is
//! forwarded upstream untouched, only a missing role is defaulted.

use serde::{Deserialize, Serialize};

/// Role of the synthesized instruction message
pub const ROLE_SYSTEM: &str = "system";
/// Role of end-user messages (and the default for role-less input)
pub const ROLE_USER: &str = "user";
/// Role of model answers replayed as history
pub const ROLE_ASSISTANT: &str = "assistant";

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an arbitrary role
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ROLE_SYSTEM, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ROLE_USER, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ROLE_ASSISTANT, content)
    }

    /// Whether this is the synthesized system instruction
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.role == ROLE_SYSTEM
    }

    /// Content length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
