//! Process-wide server state
//!
//! Diagnostic fields (`last_query`, `last_route`) are last-writer-wins across
//! concurrent requests. The cache sits behind a std mutex that is never held
//! across an await point.

use crate::cache::ResponseCache;
use campus_llm::util::truncate_chars;
use campus_llm::{Provider, RouteDecision};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Characters of the latest message kept for the report endpoint
pub const DEFAULT_QUERY_AUDIT_CHARS: usize = 120;

/// Lock-free request counters
#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    requests_total: AtomicU64,
    chat_requests_total: AtomicU64,
    cache_hits_total: AtomicU64,
    cache_misses_total: AtomicU64,
    local_routes_total: AtomicU64,
    cloud_routes_total: AtomicU64,
    fallback_responses_total: AtomicU64,
}

/// Point-in-time copy of [`RuntimeMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Every HTTP request seen
    pub requests_total: u64,
    /// `/api/chat` requests
    pub chat_requests_total: u64,
    /// Chat answers replayed from cache
    pub cache_hits_total: u64,
    /// Chat lookups that missed
    pub cache_misses_total: u64,
    /// Requests routed to the local runtime
    pub local_routes_total: u64,
    /// Requests routed to the cloud API
    pub cloud_routes_total: u64,
    /// Requests answered by the fallback streamer
    pub fallback_responses_total: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl RuntimeMetrics {
    /// Count an HTTP request
    pub fn record_request(&self) {
        bump(&self.requests_total);
    }

    /// Count a chat request
    pub fn record_chat(&self) {
        bump(&self.chat_requests_total);
    }

    /// Count a cache lookup outcome
    pub fn record_cache(&self, hit: bool) {
        bump(if hit {
            &self.cache_hits_total
        } else {
            &self.cache_misses_total
        });
    }

    /// Count a routing decision
    pub fn record_route(&self, provider: Provider) {
        bump(match provider {
            Provider::Local => &self.local_routes_total,
            Provider::Cloud => &self.cloud_routes_total,
        });
    }

    /// Count a fallback answer
    pub fn record_fallback(&self) {
        bump(&self.fallback_responses_total);
    }

    /// Read all counters
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_total: load(&self.requests_total),
            chat_requests_total: load(&self.chat_requests_total),
            cache_hits_total: load(&self.cache_hits_total),
            cache_misses_total: load(&self.cache_misses_total),
            local_routes_total: load(&self.local_routes_total),
            cloud_routes_total: load(&self.cloud_routes_total),
            fallback_responses_total: load(&self.fallback_responses_total),
        }
    }
}

/// Shared state read by the report endpoint and written by chat requests
#[derive(Debug)]
pub struct ServerState {
    last_query: Mutex<String>,
    last_route: Mutex<String>,
    cache: Mutex<ResponseCache>,
    metrics: RuntimeMetrics,
    query_audit_chars: usize,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ResponseCache::default())
    }
}

impl ServerState {
    /// Create state around an existing cache
    #[must_use]
    pub fn new(cache: ResponseCache) -> Self {
        Self {
            last_query: Mutex::new(String::new()),
            last_route: Mutex::new(String::new()),
            cache: Mutex::new(cache),
            metrics: RuntimeMetrics::default(),
            query_audit_chars: DEFAULT_QUERY_AUDIT_CHARS,
        }
    }

    /// Remember the newest user message (truncated)
    pub fn record_query(&self, latest: &str) {
        let truncated = truncate_chars(latest, self.query_audit_chars).to_string();
        *self.last_query.lock().unwrap_or_else(|e| e.into_inner()) = truncated;
    }

    /// Remember the last routing decision
    pub fn record_route(&self, decision: &RouteDecision) {
        *self.last_route.lock().unwrap_or_else(|e| e.into_inner()) = decision.audit_string();
        self.metrics.record_route(decision.provider);
    }

    /// Most recent recorded query
    #[must_use]
    pub fn last_query(&self) -> String {
        self.last_query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Most recent routing audit string
    #[must_use]
    pub fn last_route(&self) -> String {
        self.last_route
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Cached answer for `key`, if any
    #[must_use]
    pub fn cache_get(&self, key: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .map(str::to_string)
    }

    /// Store an answer
    pub fn cache_put(&self, key: String, value: String) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(key, value);
    }

    /// Number of cached answers
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Request counters
    #[must_use]
    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }
}
