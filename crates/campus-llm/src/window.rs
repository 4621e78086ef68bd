//! Conversation window
//!
//! A request's messages are coerced into [`ChatMessage`]s, trimmed, and cut
//! down to the most recent suffix that fits the character budget. The window
//! always starts with the synthesized system instruction.

use crate::message::{ChatMessage, ROLE_USER};
use serde_json::Value;

/// Ordered messages sent upstream, newest last, system instruction first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationWindow {
    messages: Vec<ChatMessage>,
}

impl ConversationWindow {
    /// Build a window from already-typed messages.
    ///
    /// Messages whose trimmed content is empty are dropped. Walking from the
    /// newest message backwards, messages are kept while the running total of
    /// content characters stays within `max_chars`; the first message that
    /// overflows the budget ends the walk, so the kept messages are always a
    /// contiguous suffix of the input.
    #[must_use]
    pub fn build(history: Vec<ChatMessage>, max_chars: usize, system_prompt: &str) -> Self {
        let normalized: Vec<ChatMessage> = history
            .into_iter()
            .filter_map(|m| {
                let content = m.content.trim();
                if content.is_empty() {
                    return None;
                }
                let role = if m.role.is_empty() {
                    ROLE_USER.to_string()
                } else {
                    m.role
                };
                Some(ChatMessage::new(role, content))
            })
            .collect();

        let mut total = 0usize;
        let mut kept = Vec::with_capacity(normalized.len());
        for message in normalized.into_iter().rev() {
            total += message.char_len();
            if total > max_chars {
                break;
            }
            kept.push(message);
        }
        kept.reverse();

        let mut messages = Vec::with_capacity(kept.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(kept);
        Self { messages }
    }

    /// Build a window from the raw `messages` value of a request body.
    #[must_use]
    pub fn from_json(raw: &Value, max_chars: usize, system_prompt: &str) -> Self {
        Self::build(coerce_messages(raw), max_chars, system_prompt)
    }

    /// All messages, system instruction included
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages, system instruction included
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no conversation message survived trimming
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest().is_none()
    }

    /// The newest non-system message
    #[must_use]
    pub fn latest(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| !m.is_system())
    }

    /// Content of the newest non-system message, or `""`
    #[must_use]
    pub fn latest_content(&self) -> &str {
        self.latest().map_or("", |m| m.content.as_str())
    }

    /// Total characters across non-system messages
    #[must_use]
    pub fn conversation_chars(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| !m.is_system())
            .map(ChatMessage::char_len)
            .sum()
    }
}

/// Leniently turn a JSON `messages` value into typed messages.
///
/// Anything that is not an array yields no messages. Entries that are not
/// objects are skipped. A missing or falsy `role` becomes `"user"`; a
/// non-string role is stringified. A falsy `content` becomes empty; other
/// non-string content is rendered as JSON text.
#[must_use]
pub fn coerce_messages(raw: &Value) -> Vec<ChatMessage> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let role = coerce_text(obj.get("role"))
                .unwrap_or_else(|| ROLE_USER.to_string());
            let content = coerce_text(obj.get("content")).unwrap_or_default();
            ChatMessage::new(role, content)
        })
        .collect()
}

/// Render a loosely typed JSON field as text.
///
/// Missing and falsy values (`null`, `false`, `0`, `""`) give `None`;
/// strings are taken as-is and anything else becomes its JSON text.
#[must_use]
pub fn coerce_text(value: Option<&Value>) -> Option<String> {
    value.filter(|v| !is_falsy(v)).map(stringify)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
