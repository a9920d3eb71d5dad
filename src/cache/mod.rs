//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! request (method, path, query, headers)
//!     → key.rs (canonicalize headers, SHA-256 → CacheKey)
//!     → store.rs (read/write <root>/<key>.json)
//!     → record.rs (CacheRecord, base64 body)
//! ```
//!
//! # Design Decisions
//! - The cache is an explicit value injected into the proxy, never a global
//! - Records are independent files; no cross-record locking
//! - No eviction and no TTL: entries live until `clear`

pub mod key;
pub mod record;
pub mod store;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use key::CacheKey;
pub use record::CacheRecord;
pub use store::{PutOutcome, ResponseCache};

/// Errors from cache writes and maintenance. Reads never fail; they miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed.
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
