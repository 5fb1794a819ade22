//! Exclusion patterns for closure expansion

use crate::error::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

/// Patterns that keep files out of import closures.
///
/// Patterns only accumulate; there is no way to remove one.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    regexes: Vec<Regex>,
    globs: Vec<Glob>,
    glob_set: GlobSet,
}

impl ExclusionSet {
    pub fn new() -> Self {
        ExclusionSet {
            regexes: Vec::new(),
            globs: Vec::new(),
            glob_set: GlobSet::empty(),
        }
    }

    pub fn add_regex(&mut self, pattern: Regex) {
        self.regexes.push(pattern);
    }

    pub fn add_regexes<I>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = Regex>,
    {
        self.regexes.extend(patterns);
    }

    /// Compile and add a regular expression.
    pub fn add_regex_str(&mut self, pattern: &str) -> Result<(), ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.add_regex(regex);
        Ok(())
    }

    /// Compile and add a glob pattern.
    pub fn add_glob_str(&mut self, pattern: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };
        let glob = Glob::new(pattern).map_err(|e| invalid(e.to_string()))?;

        let mut builder = GlobSetBuilder::new();
        for existing in &self.globs {
            builder.add(existing.clone());
        }
        builder.add(glob.clone());
        self.glob_set = builder.build().map_err(|e| invalid(e.to_string()))?;
        self.globs.push(glob);
        Ok(())
    }

    /// Whether any pattern matches the normalized path.
    pub fn is_excluded(&self, normalized_path: &str) -> bool {
        self.regexes.iter().any(|regex| regex.is_match(normalized_path))
            || self.glob_set.is_match(normalized_path)
    }

    pub fn len(&self) -> usize {
        self.regexes.len() + self.globs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new()
    }
}
