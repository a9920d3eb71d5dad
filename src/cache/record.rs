//! On-disk representation of a cached response.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::http::headers::Headers;

/// One cached upstream response, serialized as a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub method: String,
    pub path: String,
    /// Raw query string without the leading `?`; empty when absent.
    pub query: String,
    pub status: u16,
    pub headers: Headers,
    /// Response body. Stored base64-encoded so arbitrary bytes survive JSON.
    #[serde(rename = "content", with = "base64_body")]
    pub body: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    /// Whether the stored status is one the cache is allowed to hold.
    pub fn has_cacheable_status(&self) -> bool {
        is_cacheable_status(self.status)
    }
}

/// Statuses in `[200, 400)` are cacheable; everything else is not.
pub fn is_cacheable_status(status: u16) -> bool {
    (200..400).contains(&status)
}

mod base64_body {
    use super::*;
    use base64::Engine as _;

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
