//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → proxy.rs (policy check, cache lookup, forward, store)
//!         → headers.rs (canonical headers, hop-by-hop filtering)
//!         → upstream.rs (reqwest client, timeout/failure classification)
//!     → response.rs (X-Cache marker, 502/504 bodies)
//!     → Send to client
//! ```

pub mod headers;
pub mod proxy;
pub mod response;
pub mod server;
pub mod upstream;

pub use headers::{Headers, X_CACHE};
pub use proxy::ProxyServer;
pub use server::HttpServer;
pub use upstream::{ForwardOutcome, UpstreamClient, UpstreamResponse};
