//! Cache key derivation.
//!
//! A key is the hex SHA-256 digest of the method, path, query string and the
//! canonical header list. Each field is length-prefixed before hashing, so no
//! choice of content can make two different requests hash the same input.

use std::fmt;

use axum::http::Method;
use sha2::{Digest, Sha256};

use crate::http::headers::Headers;

/// Fixed-width identifier addressing one cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request. Never fails.
    pub fn derive(method: &Method, path: &str, query: &str, headers: &Headers) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, method.as_str().as_bytes());
        update_field(&mut hasher, path.as_bytes());
        update_field(&mut hasher, query.as_bytes());

        let canonical = headers.canonical();
        hasher.update((canonical.len() as u64).to_be_bytes());
        for (name, value) in &canonical {
            update_field(&mut hasher, name.as_bytes());
            update_field(&mut hasher, value);
        }

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn update_field(hasher: &mut Sha256, field: &[u8]) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field);
}
