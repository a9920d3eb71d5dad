//! Header lists and header filtering.
//!
//! # Responsibilities
//! - Hold request/response headers as an ordered list of string pairs
//! - Produce the canonical (lowercased, name-sorted) form used for cache keys
//! - Strip headers that must not be forwarded or replayed verbatim
//!
//! # Design Decisions
//! - Names compare case-insensitively, values byte-for-byte
//! - Repeated names (e.g. `Set-Cookie`) are preserved as separate entries
//! - Values taken from a `HeaderMap` are held as ISO-8859-1 text, one char
//!   per wire byte, so obs-text and other non-UTF-8 bytes round-trip exactly

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Marker header added to every proxied response.
pub const X_CACHE: &str = "x-cache";

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Ordered list of header name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Create an empty header list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a header, keeping any existing entries with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Replace every entry named `name` with a single new value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.0.push((name, value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Remove every entry named `name`. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Canonical form for hashing: lowercased names and wire-form values,
    /// sorted by name.
    ///
    /// The sort is stable, so repeated names keep their relative order.
    pub fn canonical(&self) -> Vec<(String, Vec<u8>)> {
        let mut pairs: Vec<(String, Vec<u8>)> = self
            .0
            .iter()
            .map(|(n, v)| (n.to_ascii_lowercase(), value_to_bytes(v)))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Copy of this list without hop-by-hop headers.
    pub fn without_hop_by_hop(&self) -> Self {
        self.0
            .iter()
            .filter(|(n, _)| !is_hop_by_hop(n))
            .cloned()
            .collect()
    }

    /// Headers to send upstream: no `Host`, no `Content-Length`, no hop-by-hop.
    ///
    /// The outbound client regenerates `Host` and `Content-Length` itself.
    pub fn for_upstream(&self) -> Self {
        let mut forwarded = self.without_hop_by_hop();
        forwarded.remove("host");
        forwarded.remove("content-length");
        forwarded
    }

    /// Headers to send back to the caller. The body is re-framed by the server,
    /// so the upstream `Content-Length` is dropped along with hop-by-hop headers.
    pub fn for_downstream(&self) -> Self {
        let mut returned = self.without_hop_by_hop();
        returned.remove("content-length");
        returned
    }

    /// Build from a `HeaderMap`. Every value is kept, byte for byte.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| (name.as_str().to_string(), value_from_bytes(value.as_bytes())))
            .collect()
    }

    /// Convert to a `HeaderMap`, skipping entries that are not valid HTTP headers.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(&value_to_bytes(value)),
            ) {
                (Ok(name), Ok(value)) => {
                    map.append(name, value);
                }
                _ => {
                    tracing::debug!(header = %name, "Skipping invalid header");
                }
            }
        }
        map
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        )
    }
}

/// Decode wire bytes as ISO-8859-1. Total and reversible.
fn value_from_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Wire bytes for a stored value.
///
/// Values made only of chars up to U+00FF map back one byte per char. Anything
/// wider was set from code rather than read off the wire and is sent as UTF-8.
fn value_to_bytes(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .unwrap_or_else(|| value.as_bytes().to_vec())
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}
