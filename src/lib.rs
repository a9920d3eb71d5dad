//! Caching HTTP Proxy Library

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use cache::{CacheKey, CacheRecord, ResponseCache};
pub use config::ProxyConfig;
pub use error::AppError;
pub use http::{HttpServer, ProxyServer};
pub use lifecycle::Shutdown;
pub use routing::PathPolicy;
