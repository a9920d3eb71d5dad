//! Disk-backed response cache.
//!
//! # Layout
//! One JSON document per key: `<root>/<cache-key>.json`. Records are
//! self-contained, there is no index, and clearing the cache is emptying the
//! directory.
//!
//! # Design Decisions
//! - Only GET responses with a status in `[200, 400)` are stored
//! - Last write wins; writes go through a unique temp file and a rename so
//!   readers never observe a partial record
//! - Any read problem (missing, unreadable, corrupt, mismatched) is a miss

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::http::{Method, StatusCode};
use chrono::Utc;
use tokio::fs;

use crate::cache::key::CacheKey;
use crate::cache::record::{is_cacheable_status, CacheRecord};
use crate::cache::CacheError;
use crate::http::headers::Headers;

const RECORD_EXTENSION: &str = "json";

/// Result of a store attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// A record was written under this key.
    Stored(CacheKey),
    /// The request or response did not qualify for caching.
    Skipped,
}

/// Response cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    /// Open a cache at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| CacheError::io(&root, source))?;
        Ok(Self { root })
    }

    /// The directory backing this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a cached response. Returns `None` on any kind of miss.
    pub async fn get(
        &self,
        method: &Method,
        path: &str,
        query: &str,
        headers: &Headers,
    ) -> Option<CacheRecord> {
        if method != Method::GET {
            return None;
        }

        let key = CacheKey::derive(method, path, query, headers);
        let record_path = self.record_path(&key);

        let contents = match fs::read(&record_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Unreadable cache record, treating as miss");
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_slice(&contents) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt cache record, treating as miss");
                return None;
            }
        };

        if record.method != method.as_str() || record.path != path || record.query != query {
            tracing::warn!(key = %key, "Cache record does not match request, treating as miss");
            return None;
        }
        if !record.has_cacheable_status() {
            tracing::warn!(key = %key, status = record.status, "Cache record has uncacheable status");
            return None;
        }

        Some(record)
    }

    /// Store an upstream response.
    ///
    /// The key comes from the *request* headers, the same material `get` uses.
    #[allow(clippy::too_many_arguments)]
    pub async fn put(
        &self,
        method: &Method,
        path: &str,
        query: &str,
        request_headers: &Headers,
        status: StatusCode,
        response_headers: &Headers,
        body: &[u8],
    ) -> Result<PutOutcome, CacheError> {
        if method != Method::GET || !is_cacheable_status(status.as_u16()) {
            return Ok(PutOutcome::Skipped);
        }

        let key = CacheKey::derive(method, path, query, request_headers);
        let record = CacheRecord {
            method: method.as_str().to_string(),
            path: path.to_string(),
            query: query.to_string(),
            status: status.as_u16(),
            headers: response_headers.clone(),
            body: body.to_vec(),
            cached_at: Utc::now(),
        };
        let json = serde_json::to_vec(&record)?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CacheError::io(&self.root, source))?;

        let record_path = self.record_path(&key);
        let temp_path = self
            .root
            .join(format!("{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));

        if let Err(source) = fs::write(&temp_path, &json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CacheError::io(&temp_path, source));
        }
        if let Err(source) = fs::rename(&temp_path, &record_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CacheError::io(&record_path, source));
        }

        tracing::debug!(key = %key, path = %path, bytes = body.len(), "Stored cache record");
        Ok(PutOutcome::Stored(key))
    }

    /// Remove every record, leaving the root present and empty.
    pub async fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(CacheError::io(&self.root, source)),
        }
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CacheError::io(&self.root, source))?;

        tracing::info!(root = %self.root.display(), "Cache cleared");
        Ok(())
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.{}", key, RECORD_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn accept(value: &str) -> Headers {
        [("Accept", value)].into_iter().collect()
    }

    async fn cache_in(dir: &TempDir) -> ResponseCache {
        ResponseCache::open(dir.path().join("test_cache")).await.unwrap()
    }

    fn entries(path: &Path) -> usize {
        std::fs::read_dir(path).unwrap().count()
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        let response_headers: Headers = [("Content-Type", "application/json")].into_iter().collect();

        let outcome = cache
            .put(
                &Method::GET,
                "/test",
                "param=value",
                &accept("application/json"),
                StatusCode::OK,
                &response_headers,
                br#"{"test":"data"}"#,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, PutOutcome::Stored(_)));

        let cached = cache
            .get(&Method::GET, "/test", "param=value", &accept("application/json"))
            .await
            .expect("record should be cached");
        assert_eq!(cached.method, "GET");
        assert_eq!(cached.path, "/test");
        assert_eq!(cached.query, "param=value");
        assert_eq!(cached.status, 200);
        assert_eq!(cached.headers, response_headers);
        assert_eq!(cached.body, br#"{"test":"data"}"#);

        let other = cache
            .get(&Method::GET, "/test", "param=value", &accept("text/html"))
            .await;
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_miss_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        assert!(cache
            .get(&Method::GET, "/nonexistent", "", &Headers::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_non_get_requests_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;

        let outcome = cache
            .put(&Method::POST, "/test", "", &Headers::new(), StatusCode::OK, &Headers::new(), b"test")
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::Skipped);
        assert!(cache.get(&Method::POST, "/test", "", &Headers::new()).await.is_none());
        assert_eq!(entries(cache.root()), 0);
    }

    #[tokio::test]
    async fn test_error_responses_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;

        for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR, StatusCode::CONTINUE] {
            let outcome = cache
                .put(&Method::GET, "/test", "", &Headers::new(), status, &Headers::new(), b"Not Found")
                .await
                .unwrap();
            assert_eq!(outcome, PutOutcome::Skipped);
        }
        assert!(cache.get(&Method::GET, "/test", "", &Headers::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_redirects_are_cached() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        let location: Headers = [("Location", "/new")].into_iter().collect();

        cache
            .put(&Method::GET, "/old", "", &Headers::new(), StatusCode::FOUND, &location, b"")
            .await
            .unwrap();
        let cached = cache.get(&Method::GET, "/old", "", &Headers::new()).await.unwrap();
        assert_eq!(cached.status, 302);
        assert_eq!(cached.headers.get("location"), Some("/new"));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;

        for body in [&b"first"[..], &b"second"[..]] {
            cache
                .put(&Method::GET, "/page", "", &Headers::new(), StatusCode::OK, &Headers::new(), body)
                .await
                .unwrap();
        }
        let cached = cache.get(&Method::GET, "/page", "", &Headers::new()).await.unwrap();
        assert_eq!(cached.body, b"second");
        assert_eq!(entries(cache.root()), 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        let key = CacheKey::derive(&Method::GET, "/broken", "", &Headers::new());
        std::fs::write(cache.record_path(&key), "{ not json").unwrap();

        assert!(cache.get(&Method::GET, "/broken", "", &Headers::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_record_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        cache
            .put(&Method::GET, "/a", "", &Headers::new(), StatusCode::OK, &Headers::new(), b"a")
            .await
            .unwrap();

        let key_a = CacheKey::derive(&Method::GET, "/a", "", &Headers::new());
        let key_b = CacheKey::derive(&Method::GET, "/b", "", &Headers::new());
        std::fs::rename(cache.record_path(&key_a), cache.record_path(&key_b)).unwrap();

        assert!(cache.get(&Method::GET, "/b", "", &Headers::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_directory() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        std::fs::write(cache.root().join("test.json"), "test").unwrap();
        cache
            .put(&Method::GET, "/a", "", &Headers::new(), StatusCode::OK, &Headers::new(), b"a")
            .await
            .unwrap();

        cache.clear().await.unwrap();
        assert!(cache.root().exists());
        assert_eq!(entries(cache.root()), 0);

        cache.clear().await.unwrap();
        assert!(cache.root().exists());
        assert_eq!(entries(cache.root()), 0);
    }

    #[tokio::test]
    async fn test_clear_nonexistent_cache_creates_it() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        std::fs::remove_dir_all(cache.root()).unwrap();

        cache.clear().await.unwrap();
        assert!(cache.root().exists());
    }

    #[tokio::test]
    async fn test_put_recreates_missing_root() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        std::fs::remove_dir_all(cache.root()).unwrap();

        let outcome = cache
            .put(&Method::GET, "/a", "", &Headers::new(), StatusCode::OK, &Headers::new(), b"a")
            .await
            .unwrap();
        assert!(matches!(outcome, PutOutcome::Stored(_)));
    }

    #[tokio::test]
    async fn test_non_utf8_header_values_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;

        let mut request = axum::http::HeaderMap::new();
        request.insert("x-name", axum::http::HeaderValue::from_bytes(b"caf\xe9").unwrap());
        let mut response = axum::http::HeaderMap::new();
        response.insert("x-label", axum::http::HeaderValue::from_bytes(b"na\xefve").unwrap());
        let request = Headers::from_header_map(&request);
        let response = Headers::from_header_map(&response);

        cache
            .put(&Method::GET, "/menu", "", &request, StatusCode::OK, &response, b"menu")
            .await
            .unwrap();

        let cached = cache.get(&Method::GET, "/menu", "", &request).await.unwrap();
        assert_eq!(cached.headers.to_header_map()["x-label"].as_bytes(), b"na\xefve");
        assert!(cache.get(&Method::GET, "/menu", "", &Headers::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_put_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir).await;
        std::fs::remove_dir_all(cache.root()).unwrap();
        std::fs::write(cache.root(), "not a directory").unwrap();

        let result = cache
            .put(&Method::GET, "/a", "", &Headers::new(), StatusCode::OK, &Headers::new(), b"a")
            .await;
        assert!(matches!(result, Err(CacheError::Io { .. })));
        assert!(cache.get(&Method::GET, "/a", "", &Headers::new()).await.is_none());
    }
}
