//! Glob path matching.
//!
//! # Responsibilities
//! - Compile fnmatch-style patterns (`*`, `?`, `[seq]`, `[!seq]`) once
//! - Match request paths against the compiled form
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `*` crosses `/`, so `/realtime/*` covers every nested path
//! - Patterns are anchored at both ends; a bare literal is an exact match
//! - Compilation errors surface at startup, matching never fails

use regex::Regex;
use thiserror::Error;

/// Error compiling a glob pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("unterminated character class in pattern {0:?}")]
    UnclosedClass(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled glob pattern over request paths.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: String,
    regex: Regex,
}

impl GlobMatcher {
    /// Compile a glob pattern.
    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let translated = translate(&pattern)?;
        let regex = Regex::new(&translated).map_err(|source| PatternError::Invalid {
            pattern: pattern.clone(),
            source,
        })?;

        Ok(Self { pattern, regex })
    }

    /// The pattern as written in configuration.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the whole path matches.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Translate a glob into an anchored regular expression.
fn translate(pattern: &str) -> Result<String, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 8);
    out.push_str("(?s)^");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Collapse runs of '*'
                while i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                i = translate_class(&chars, i, &mut out)
                    .ok_or_else(|| PatternError::UnclosedClass(pattern.to_string()))?;
            }
            c => push_escaped(&mut out, c),
        }
        i += 1;
    }

    out.push('$');
    Ok(out)
}

/// Translate the class starting at `start` (a `[`). Returns the index of the
/// closing `]`, or `None` if the class never closes.
fn translate_class(chars: &[char], start: usize, out: &mut String) -> Option<usize> {
    let mut j = start + 1;
    let negated = chars.get(j) == Some(&'!');
    if negated {
        j += 1;
    }

    // A ']' right after the opening bracket is a literal member.
    let first = j;
    let mut end = None;
    let mut k = j;
    while k < chars.len() {
        if chars[k] == ']' && k != first {
            end = Some(k);
            break;
        }
        k += 1;
    }
    let end = end?;

    out.push('[');
    if negated {
        out.push('^');
    }
    for (offset, &c) in chars[first..end].iter().enumerate() {
        let is_range_dash = c == '-' && offset != 0 && first + offset + 1 != end;
        if is_range_dash {
            out.push('-');
        } else {
            push_escaped(out, c);
        }
    }
    out.push(']');
    Some(end)
}

fn push_escaped(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
