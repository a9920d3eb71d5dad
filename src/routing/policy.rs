//! Path-based cache policy.
//!
//! A path matching any configured `--no-cache` pattern is never read from
//! and never written to the cache. Everything else is eligible.

use crate::routing::matcher::{GlobMatcher, PatternError};

/// Immutable set of patterns excluding paths from caching.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    excluded: Vec<GlobMatcher>,
}

impl PathPolicy {
    /// Compile the given patterns, in order. Fails on the first invalid one.
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let excluded = patterns
            .into_iter()
            .map(GlobMatcher::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { excluded })
    }

    /// A policy that lets every path use the cache.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether `path` may be served from and stored to the cache.
    pub fn allows(&self, path: &str) -> bool {
        !self.excluded.iter().any(|m| m.matches(path))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(GlobMatcher::pattern)
    }
}
