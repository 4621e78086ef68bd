//! Mock chat provider for testing
//!
//! Replies are scripted up front and consumed in order; once the queue is
//! empty the provider streams a fixed default answer.

use crate::error::{Error, Result};
use crate::provider::ChatProvider;
use crate::router::Provider;
use crate::stream::DeltaSink;
use crate::window::ConversationWindow;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Text streamed when no reply is queued
pub const DEFAULT_REPLY: &str = "mock response";

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream these increments, then finish
    Stream(Vec<String>),
    /// Fail before streaming anything
    Fail(String),
    /// Stream some increments, then fail
    Partial(Vec<String>, String),
    /// Never finish (for timeout paths)
    Hang,
}

/// A recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Model requested
    pub model: String,
    /// Window size, system message included
    pub messages: usize,
    /// Newest non-system content
    pub latest: String,
}

/// A scripted provider that records every call
#[derive(Clone)]
pub struct MockProvider {
    kind: Provider,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a mock for the given provider family.
    #[must_use]
    pub fn new(kind: Provider) -> Self {
        Self {
            kind,
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply.
    pub fn push_reply(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Queue a streamed reply made of `parts`.
    pub fn push_stream<I, S>(&self, parts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts = parts.into_iter().map(Into::into).collect();
        self.push_reply(MockReply::Stream(parts));
    }

    /// Queue a failure with `message`.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.push_reply(MockReply::Fail(message.into()));
    }

    /// Calls received so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| MockReply::Stream(vec![DEFAULT_REPLY.to_string()]))
    }
}

fn failure(message: String) -> Error {
    Error::Upstream {
        status: 500,
        message,
    }
}

async fn emit_all(parts: Vec<String>, sink: &DeltaSink) -> Result<String> {
    let mut full = String::new();
    for part in parts {
        full.push_str(&part);
        sink.emit(part).await?;
    }
    Ok(full)
}

#[async_trait::async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn kind(&self) -> Provider {
        self.kind
    }

    async fn stream_chat(
        &self,
        model: &str,
        window: &ConversationWindow,
        sink: &DeltaSink,
    ) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockCall {
                model: model.to_string(),
                messages: window.len(),
                latest: window.latest_content().to_string(),
            });

        match self.next_reply() {
            MockReply::Stream(parts) => emit_all(parts, sink).await,
            MockReply::Fail(message) => Err(failure(message)),
            MockReply::Partial(parts, message) => {
                emit_all(parts, sink).await?;
                Err(failure(message))
            }
            MockReply::Hang => std::future::pending().await,
        }
    }
}
