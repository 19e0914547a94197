//! Translation of raw request and attribute values into method names.

use std::sync::Arc;

use super::error::DomainError;
use super::pattern_cache::PatternCache;
use crate::config::TranslatorConfig;

/// Maps a raw value to the method it stands for.
#[derive(Debug)]
pub struct MethodTranslator {
    config: TranslatorConfig,
    patterns: Arc<PatternCache>,
}

impl MethodTranslator {
    /// Builds the translator, compiling every configured pattern up front.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidPattern`] if a pattern does not compile.
    pub fn new(config: TranslatorConfig, patterns: Arc<PatternCache>) -> Result<Self, DomainError> {
        if let TranslatorConfig::Regex { mappings, .. } = &config {
            for mapping in mappings {
                patterns.get(&mapping.pattern)?;
            }
        }
        Ok(Self { config, patterns })
    }

    #[must_use]
    pub fn passthrough() -> Self {
        Self {
            config: TranslatorConfig::Passthrough,
            patterns: Arc::new(PatternCache::new()),
        }
    }

    /// Translates `value` requested for `service_id`.
    ///
    /// `None` means the value asks for no method.
    ///
    /// # Errors
    ///
    /// [`DomainError::UnrecognizedMethod`] if nothing matches and unmatched
    /// values are not ignored.
    pub fn translate(&self, service_id: &str, value: &str) -> Result<Option<String>, DomainError> {
        let unrecognized = || DomainError::UnrecognizedMethod {
            method: value.to_owned(),
            service_id: service_id.to_owned(),
        };

        match &self.config {
            TranslatorConfig::Passthrough => Ok(Some(value.to_owned())),
            TranslatorConfig::Static {
                mappings,
                ignore_if_no_match,
            } => {
                if let Some(mapping) = mappings
                    .iter()
                    .find(|m| m.values.iter().any(|v| v == value))
                {
                    return Ok(Some(mapping.method.clone()));
                }
                if *ignore_if_no_match {
                    Ok(Some(value.to_owned()))
                } else {
                    Err(unrecognized())
                }
            }
            TranslatorConfig::Regex {
                mappings,
                ignore_if_no_match,
                default_method,
            } => {
                for mapping in mappings {
                    if self.patterns.full_match(&mapping.pattern, value)? {
                        return Ok(Some(mapping.method.clone()));
                    }
                }
                if *ignore_if_no_match {
                    Ok(default_method
                        .as_deref()
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_owned))
                } else {
                    Err(unrecognized())
                }
            }
        }
    }
}
