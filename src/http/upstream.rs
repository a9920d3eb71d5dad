//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the target URL from the upstream base, path and query
//! - Send one request with redirects disabled and a total timeout
//! - Buffer the full response body
//! - Classify the result as success, timeout or failure
//!
//! # Design Decisions
//! - Single attempt; callers often carry their own retry policy
//! - Timeouts are distinct from other errors (504 vs. 502)
//! - Redirects are returned to the caller untouched

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode};

use crate::http::headers::Headers;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Bytes,
}

/// Outcome of forwarding one request.
#[derive(Debug)]
pub enum ForwardOutcome {
    Success(UpstreamResponse),
    /// No complete response within the timeout ceiling.
    Timeout,
    /// Connection refused, DNS failure, protocol error and the like.
    Failed(String),
}

/// HTTP client bound to one upstream origin.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    /// Create a client for `base` (e.g. `http://example.com/api`).
    pub fn new(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upstream URL for a request path and raw query string.
    pub fn target_url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.base, path)
        } else {
            format!("{}{}?{}", self.base, path, query)
        }
    }

    /// Forward a request. `headers` must already be filtered for upstream use.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: &str,
        headers: &Headers,
        body: Option<Bytes>,
    ) -> ForwardOutcome {
        let url = self.target_url(path, query);
        tracing::info!(method = %method, url = %url, "Forwarding request");

        let mut request = self
            .client
            .request(method, &url)
            .headers(headers.to_header_map());
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&url, e),
        };

        let status = response.status();
        let response_headers = Headers::from_header_map(response.headers());
        match response.bytes().await {
            Ok(body) => ForwardOutcome::Success(UpstreamResponse {
                status,
                headers: response_headers,
                body,
            }),
            Err(e) => classify_error(&url, e),
        }
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> ForwardOutcome {
    if error.is_timeout() {
        tracing::error!(url = %url, "Timeout forwarding request");
        ForwardOutcome::Timeout
    } else {
        tracing::error!(url = %url, error = %error, "Error forwarding request");
        ForwardOutcome::Failed(error_chain(&error))
    }
}

/// Render an error with its sources, e.g. `error sending request: connection refused`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
