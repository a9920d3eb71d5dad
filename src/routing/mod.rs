//! Cache eligibility by request path.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     --no-cache patterns
//!     → matcher.rs (compile globs, reject invalid ones)
//!     → policy.rs (freeze as immutable PathPolicy)
//!
//! Per request:
//!     path → PathPolicy::allows → cache lookup/store enabled or skipped
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - Any match excludes the path; order only matters for reporting

pub mod matcher;
pub mod policy;

pub use matcher::{GlobMatcher, PatternError};
pub use policy::PathPolicy;
