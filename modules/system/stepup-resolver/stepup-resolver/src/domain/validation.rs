//! Validation-time check that a chain of authentications satisfied the
//! required method.

use stepup_resolver_sdk::Authentication;

use super::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSpecification {
    required_method: Option<String>,
    service_id: Option<String>,
    allow_proxied: bool,
}

impl ValidationSpecification {
    #[must_use]
    pub fn new(required_method: Option<String>) -> Self {
        Self {
            required_method: required_method.filter(|m| !m.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Service named in protocol errors.
    #[must_use]
    pub fn for_service(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    /// Accept chains longer than one authentication.
    #[must_use]
    pub fn allow_proxied(mut self, allow: bool) -> Self {
        self.allow_proxied = allow;
        self
    }

    /// Checks `chain`, whose last entry carries the satisfied methods.
    ///
    /// # Errors
    ///
    /// - [`DomainError::UnacceptableMethod`] if a method is required and the
    ///   last authentication satisfied none
    /// - [`DomainError::UnrecognizedMethod`] if it satisfied others but not the
    ///   required one
    pub fn is_satisfied_by(&self, chain: &[Authentication]) -> Result<bool, DomainError> {
        let Some(last) = chain.last() else {
            return Ok(false);
        };

        if let Some(required) = &self.required_method {
            let satisfied = last.satisfied_methods();
            if satisfied.is_empty() {
                return Err(DomainError::UnacceptableMethod {
                    method: required.clone(),
                });
            }
            if !satisfied.contains(required) {
                return Err(DomainError::UnrecognizedMethod {
                    method: required.clone(),
                    service_id: self.service_id.clone().unwrap_or_default(),
                });
            }
        }

        Ok(self.allow_proxied || chain.len() == 1)
    }
}
