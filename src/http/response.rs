//! Response construction.
//!
//! # Responsibilities
//! - Turn cache records and upstream responses into client responses
//! - Stamp every response with `X-Cache: HIT|MISS`
//! - Map forwarding failures to 502/504 with a readable body
//!
//! # Design Decisions
//! - Bodies are fully buffered; framing headers are regenerated by the server
//! - Synthetic error responses count as misses

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::cache::CacheRecord;
use crate::http::headers::{Headers, X_CACHE};
use crate::http::upstream::UpstreamResponse;

/// Value of the `X-Cache` marker header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Response replayed from the cache.
///
/// Returns `None` if the stored status is not a valid HTTP status.
pub fn from_cache(record: CacheRecord) -> Option<Response> {
    let status = StatusCode::from_u16(record.status).ok()?;
    Some(build(status, &record.headers, Body::from(record.body), CacheStatus::Hit))
}

/// Response relayed from the upstream. `headers` should already be filtered
/// for downstream use.
pub fn from_upstream(upstream: UpstreamResponse, headers: &Headers) -> Response {
    build(upstream.status, headers, Body::from(upstream.body), CacheStatus::Miss)
}

pub fn gateway_timeout() -> Response {
    synthetic(
        StatusCode::GATEWAY_TIMEOUT,
        "Gateway Timeout: The server timed out waiting for the target URL".to_string(),
    )
}

pub fn bad_gateway(reason: &str) -> Response {
    synthetic(
        StatusCode::BAD_GATEWAY,
        format!("Bad Gateway: Error forwarding request: {}", reason),
    )
}

pub fn bad_request(reason: &str) -> Response {
    synthetic(
        StatusCode::BAD_REQUEST,
        format!("Bad Request: Error reading request body: {}", reason),
    )
}

pub fn payload_too_large() -> Response {
    synthetic(
        StatusCode::PAYLOAD_TOO_LARGE,
        "Payload Too Large: request body exceeds the configured limit".to_string(),
    )
}

fn build(status: StatusCode, headers: &Headers, body: Body, cache: CacheStatus) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers.to_header_map();
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static(cache.as_str()));
    response
}

fn synthetic(status: StatusCode, message: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::HeaderName::from_static(X_CACHE), CacheStatus::Miss.as_str()),
        ],
        message,
    )
        .into_response()
}
