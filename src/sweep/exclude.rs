//! Exclusion patterns: shell-style globs compiled to anchored regexes.
//!
//! A file whose absolute path matches any configured pattern is invisible to
//! the engine — it is neither truncated, quarantined, nor counted.

use std::path::Path;

use regex::Regex;

use crate::core::errors::{FqhError, Result};

/// One compiled exclusion pattern.
#[derive(Debug, Clone)]
struct GlobPattern {
    original: String,
    compiled: Regex,
}

/// Set of compiled exclusion globs.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<GlobPattern>,
}

impl ExcludeSet {
    /// Compile a set of glob patterns.
    ///
    /// Patterns use shell-style globs: `*` matches within a path component,
    /// `**` matches across path components, `?` matches a single character.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|pat| {
                let re = glob_to_regex(pat)?;
                Ok(GlobPattern {
                    original: pat.clone(),
                    compiled: re,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns: compiled })
    }

    /// Whether `path` matches any exclusion pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|p| p.compiled.is_match(&normalized))
    }

    /// The pattern that excludes `path`, for log lines.
    #[must_use]
    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.patterns
            .iter()
            .find(|p| p.compiled.is_match(&normalized))
            .map(|p| p.original.as_str())
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no patterns are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Validate that a glob pattern can be compiled.
pub fn validate_glob_pattern(pattern: &str) -> Result<()> {
    glob_to_regex(pattern).map(|_| ())
}

/// Convert a shell-style glob pattern to a regex.
///
/// Supports:
/// - `**` → matches any path (including separators)
/// - `*`  → matches anything except `/`
/// - `?`  → matches a single character except `/`
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let normalized_pattern = pattern.replace('\\', "/");
    let mut regex_str = String::with_capacity(pattern.len() * 2);
    regex_str.push('^');

    let chars: Vec<char> = normalized_pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if i + 1 < chars.len() && chars[i + 1] == '*' => {
                if i + 2 < chars.len() && chars[i + 2] == '/' {
                    regex_str.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    regex_str.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                regex_str.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                regex_str.push_str("[^/]");
                i += 1;
            }
            '.' | '+' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '$' | '|' | '\\' => {
                regex_str.push('\\');
                regex_str.push(chars[i]);
                i += 1;
            }
            c => {
                regex_str.push(c);
                i += 1;
            }
        }
    }

    regex_str.push('$');

    Regex::new(&regex_str).map_err(|err| FqhError::InvalidConfig {
        details: format!("invalid glob pattern {pattern:?}: {err}"),
    })
}
