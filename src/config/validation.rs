//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Upstream URL must be absolute http(s) with a host
//! - Value ranges (port, timeouts, limits)
//! - Every `no_cache` pattern must compile
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use url::Url;

use crate::config::schema::ProxyConfig;
use crate::routing::GlobMatcher;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `upstream.url`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_upstream(&config.upstream.url, &mut errors);

    if config.listener.port == 0 {
        errors.push(ValidationError::new("listener.port", "port must be between 1 and 65535"));
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "host must not be empty"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "timeout must be greater than zero"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "limit must be greater than zero"));
    }
    if config.cache.dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("cache.dir", "cache directory must not be empty"));
    }

    for (i, pattern) in config.cache.no_cache.iter().enumerate() {
        if let Err(e) = GlobMatcher::new(pattern.as_str()) {
            errors.push(ValidationError::new(format!("cache.no_cache[{}]", i), e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(raw: &str, errors: &mut Vec<ValidationError>) {
    if raw.is_empty() {
        errors.push(ValidationError::new("upstream.url", "upstream URL is required"));
        return;
    }

    match Url::parse(raw) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::new(
                    "upstream.url",
                    format!("unsupported scheme {:?}, expected http or https", url.scheme()),
                ));
            }
            if url.host_str().map_or(true, str::is_empty) {
                errors.push(ValidationError::new("upstream.url", "upstream URL has no host"));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::new(
                    "upstream.url",
                    "upstream URL must not carry a query or fragment",
                ));
            }
        }
        Err(e) => {
            errors.push(ValidationError::new("upstream.url", format!("invalid URL {:?}: {}", raw, e)));
        }
    }
}
