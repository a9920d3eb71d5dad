//! Per-request proxy lifecycle.
//!
//! ```text
//! START → CHECK_POLICY → CACHE_LOOKUP ──hit──────────────────────────→ RESPOND
//!                  │            │miss
//!                  └─skip───────┴→ FORWARD → SUCCESS → [CACHE_STORE] → RESPOND
//!                                          → TIMEOUT ──(504)─────────→ RESPOND
//!                                          → FAILED  ──(502)─────────→ RESPOND
//! ```
//!
//! Lookup and store both require a GET and a path the policy allows. The key
//! for both is derived from the inbound request headers as received, before
//! any filtering for the upstream.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    http::{Method, Request},
    response::Response,
};

use http_body_util::LengthLimitError;

use crate::cache::{PutOutcome, ResponseCache};
use crate::http::headers::Headers;
use crate::http::response::{self, CacheStatus};
use crate::http::upstream::{ForwardOutcome, UpstreamClient};
use crate::observability::metrics;
use crate::routing::PathPolicy;

/// Orchestrates cache lookup, forwarding and cache population.
#[derive(Debug)]
pub struct ProxyServer {
    cache: ResponseCache,
    policy: PathPolicy,
    upstream: UpstreamClient,
    max_body_bytes: usize,
}

impl ProxyServer {
    pub fn new(
        cache: ResponseCache,
        policy: PathPolicy,
        upstream: UpstreamClient,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            cache,
            policy,
            upstream,
            max_body_bytes,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Handle one inbound request. Never fails: every outcome is a response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let query = request.uri().query().unwrap_or("").to_string();
        let headers = Headers::from_header_map(request.headers());

        let cacheable = method == Method::GET && self.policy.allows(&path);

        if cacheable {
            if let Some(record) = self.cache.get(&method, &path, &query, &headers).await {
                if let Some(hit) = response::from_cache(record) {
                    tracing::info!(method = %method, path = %path, "Serving from cache");
                    metrics::record_cache_lookup(CacheStatus::Hit);
                    metrics::record_request(method.as_str(), hit.status().as_u16(), CacheStatus::Hit, start);
                    return hit;
                }
            }
            metrics::record_cache_lookup(CacheStatus::Miss);
        } else {
            tracing::debug!(method = %method, path = %path, "Cache bypassed");
        }

        let body = if carries_body(&method) {
            match axum::body::to_bytes(request.into_body(), self.max_body_bytes).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(method = %method, path = %path, error = %e, "Request body rejected");
                    let rejected = body_rejection(e);
                    metrics::record_request(method.as_str(), rejected.status().as_u16(), CacheStatus::Miss, start);
                    return rejected;
                }
            }
        } else {
            None
        };

        let outcome = self
            .upstream
            .forward(method.clone(), &path, &query, &headers.for_upstream(), body)
            .await;

        let response = match outcome {
            ForwardOutcome::Success(upstream) => {
                let response_headers = upstream.headers.for_downstream();
                if cacheable {
                    self.store(&method, &path, &query, &headers, &response_headers, &upstream.body, upstream.status)
                        .await;
                }
                response::from_upstream(upstream, &response_headers)
            }
            ForwardOutcome::Timeout => {
                metrics::record_upstream_error("timeout");
                response::gateway_timeout()
            }
            ForwardOutcome::Failed(reason) => {
                metrics::record_upstream_error("connect");
                response::bad_gateway(&reason)
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), CacheStatus::Miss, start);
        response
    }

    /// Persist a forwarded response. Failures are logged, never surfaced.
    #[allow(clippy::too_many_arguments)]
    async fn store(
        &self,
        method: &Method,
        path: &str,
        query: &str,
        request_headers: &Headers,
        response_headers: &Headers,
        body: &Bytes,
        status: axum::http::StatusCode,
    ) {
        match self
            .cache
            .put(method, path, query, request_headers, status, response_headers, body)
            .await
        {
            Ok(PutOutcome::Stored(key)) => {
                tracing::debug!(key = %key, path = %path, "Response cached");
                metrics::record_cache_store("stored");
            }
            Ok(PutOutcome::Skipped) => {
                metrics::record_cache_store("skipped");
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to write cache record");
                metrics::record_cache_store("error");
            }
        }
    }
}

/// 413 when the body ran past the limit, 400 for any other read failure
/// (e.g. the client hung up mid-body).
fn body_rejection(error: axum::Error) -> Response {
    let reason = error.to_string();
    if error.into_inner().is::<LengthLimitError>() {
        response::payload_too_large()
    } else {
        response::bad_request(&reason)
    }
}

/// Only these methods have their request body forwarded.
fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}
