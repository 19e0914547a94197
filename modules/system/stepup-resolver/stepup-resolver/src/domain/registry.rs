//! Registry of recognized authentication methods.

use std::collections::HashMap;
use std::path::Path;

use stepup_resolver_sdk::AuthenticationMethod;

use super::error::DomainError;
use crate::config::StepUpResolverConfig;

/// Read-only set of recognized methods keyed by name. Built once at
/// startup.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, AuthenticationMethod>,
}

impl MethodRegistry {
    /// Builds a registry from method definitions.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] if a name is registered twice.
    pub fn from_methods(
        methods: impl IntoIterator<Item = AuthenticationMethod>,
    ) -> Result<Self, DomainError> {
        let mut registry = Self::default();
        for method in methods {
            registry.insert(method)?;
        }
        Ok(registry)
    }

    /// Builds a registry from `(name, rank)` pairs.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] if a name is registered twice.
    pub fn from_ranks<K: Into<String>>(
        ranks: impl IntoIterator<Item = (K, i32)>,
    ) -> Result<Self, DomainError> {
        Self::from_methods(
            ranks
                .into_iter()
                .map(|(name, rank)| AuthenticationMethod::new(name, rank)),
        )
    }

    /// Parses a JSON array of `{"name", "rank"}` objects.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] on malformed JSON or a duplicate name.
    pub fn from_json_str(json: &str) -> Result<Self, DomainError> {
        let methods: Vec<AuthenticationMethod> = serde_json::from_str(json)?;
        Self::from_methods(methods)
    }

    /// Reads [`MethodRegistry::from_json_str`] input from a file.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidConfig(format!(
                "cannot read methods file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Inline methods followed by the methods file, if configured.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] if the file cannot be loaded or a name
    /// appears twice across both sources.
    pub fn from_config(config: &StepUpResolverConfig) -> Result<Self, DomainError> {
        let mut registry = Self::from_methods(config.methods.iter().cloned())?;
        if let Some(path) = &config.methods_file {
            for method in Self::from_json_file(path)?.methods.into_values() {
                registry.insert(method)?;
            }
        }
        tracing::debug!(methods = registry.len(), "Method registry assembled");
        Ok(registry)
    }

    fn insert(&mut self, method: AuthenticationMethod) -> Result<(), DomainError> {
        if self.methods.contains_key(method.name()) {
            return Err(DomainError::InvalidConfig(format!(
                "authentication method '{}' is registered more than once",
                method.name()
            )));
        }
        self.methods.insert(method.name().to_owned(), method);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AuthenticationMethod> {
        self.methods.get(name)
    }

    /// Like [`MethodRegistry::get`], failing for unknown names.
    ///
    /// # Errors
    ///
    /// [`DomainError::UnregisteredMethod`] if `name` is not registered.
    pub fn require(&self, name: &str) -> Result<&AuthenticationMethod, DomainError> {
        self.get(name).ok_or_else(|| DomainError::UnregisteredMethod {
            method: name.to_owned(),
        })
    }

    /// # Errors
    ///
    /// [`DomainError::UnregisteredMethod`] if `name` is not registered.
    pub fn rank(&self, name: &str) -> Result<i32, DomainError> {
        self.require(name).map(AuthenticationMethod::rank)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
