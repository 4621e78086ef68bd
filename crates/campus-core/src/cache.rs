//! Response cache
//!
//! Bounded map from `model::prompt-prefix` to a previously generated answer.
//! Eviction follows insertion order, not access order: `get` never changes
//! an entry's position, and re-putting a key moves it to the newest slot.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 120;

/// Answers this long (in chars) or longer are never cached
pub const DEFAULT_MAX_VALUE_CHARS: usize = 6000;

/// Characters of the latest message that go into a key
pub const DEFAULT_KEY_PREFIX_CHARS: usize = 500;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    seq: u64,
    inserted_at: Instant,
}

/// Insertion-ordered bounded cache with optional expiry
#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<String, Entry>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_ttl(capacity, None)
    }

    /// Create a cache whose entries also expire after `ttl`.
    #[must_use]
    pub fn with_ttl(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl: ttl.filter(|d| !d.is_zero()),
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Build the lookup key for `latest` under `model`.
    ///
    /// The latest message is trimmed and cut to `prefix_chars`, so two prompts
    /// sharing that prefix map to the same key. Returns `None` for a blank
    /// message.
    #[must_use]
    pub fn key(model: &str, latest: &str, prefix_chars: usize) -> Option<String> {
        let latest = latest.trim();
        if latest.is_empty() {
            return None;
        }
        let prefix = campus_llm::util::truncate_chars(latest, prefix_chars);
        Some(format!("{model}::{prefix}"))
    }

    /// Look up a key. Has no side effects.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let entry = self.entries.get(key)?;
        if self.is_expired(entry, Instant::now()) {
            return None;
        }
        Some(entry.value.as_str())
    }

    /// Store `value` under `key` as the newest entry.
    ///
    /// Empty keys or values are ignored. When the cache grows past capacity
    /// the oldest-inserted entry is dropped.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if key.is_empty() || value.is_empty() {
            return;
        }

        let now = Instant::now();
        self.purge_expired(now);

        if let Some(old) = self.entries.remove(&key) {
            self.order.remove(&old.seq);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            Entry {
                value,
                seq,
                inserted_at: now,
            },
        );

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.order.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    /// Number of stored entries (expired ones included until purged)
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        now.saturating_duration_since(entry.inserted_at) >= ttl
    }

    // Insertion order is also age order, so expired entries sit at the front.
    fn purge_expired(&mut self, now: Instant) {
        if self.ttl.is_none() {
            return;
        }
        while let Some((_, key)) = self.order.first_key_value() {
            let expired = self
                .entries
                .get(key)
                .is_none_or(|entry| self.is_expired(entry, now));
            if !expired {
                break;
            }
            if let Some((_, key)) = self.order.pop_first() {
                self.entries.remove(&key);
            }
        }
    }
}
