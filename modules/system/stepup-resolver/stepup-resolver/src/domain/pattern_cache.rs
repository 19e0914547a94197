//! Shared cache of compiled attribute patterns.

use dashmap::DashMap;
use regex::Regex;

use super::error::DomainError;

/// Compiled patterns keyed by their source text.
///
/// Patterns always match the whole value. Two threads may compile the same
/// pattern concurrently; the last insert wins.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: DashMap<String, Regex>,
}

impl PatternCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled, anchored form of `pattern`.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidPattern`] if `pattern` does not compile.
    pub fn get(&self, pattern: &str) -> Result<Regex, DomainError> {
        if let Some(re) = self.compiled.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(|e| {
            DomainError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            }
        })?;
        self.compiled.insert(pattern.to_owned(), re.clone());
        Ok(re)
    }

    /// Whether `value` matches `pattern` in full.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidPattern`] if `pattern` does not compile.
    pub fn full_match(&self, pattern: &str, value: &str) -> Result<bool, DomainError> {
        Ok(self.get(pattern)?.is_match(value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn matches_whole_value_only() {
        let cache = PatternCache::new();
        assert!(cache.full_match("fac.*", "faculty").unwrap());
        assert!(!cache.full_match("fac", "faculty").unwrap());
        assert!(!cache.full_match("ulty", "faculty").unwrap());
        assert!(cache.full_match("staff|faculty", "faculty").unwrap());
    }

    #[test]
    fn compiles_once_per_pattern() {
        let cache = PatternCache::new();
        cache.full_match("a+", "aaa").unwrap();
        cache.full_match("a+", "b").unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let cache = PatternCache::new();
        let err = cache.full_match("(", "x").unwrap_err();
        assert!(matches!(err, DomainError::InvalidPattern { pattern, .. } if pattern == "("));
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(PatternCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.full_match("[a-z]+", "member").unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 1);
    }
}
