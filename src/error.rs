//! Top-level error type for the command-line entry point.

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::routing::PatternError;

/// Exit code for invalid arguments or configuration.
pub const EXIT_USAGE: u8 = 1;
/// Exit code for unexpected internal failures.
pub const EXIT_INTERNAL: u8 = 2;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("invalid no-cache pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Pattern(_) => EXIT_USAGE,
            _ => EXIT_INTERNAL,
        }
    }
}
