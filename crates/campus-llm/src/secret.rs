//! API key wrapper that keeps credentials out of logs

use crate::util::mask_api_key;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A credential that only prints in masked form
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers only
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// True when no key is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Masked representation for display
    #[must_use]
    pub fn masked(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            mask_api_key(&self.0)
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.masked())
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
