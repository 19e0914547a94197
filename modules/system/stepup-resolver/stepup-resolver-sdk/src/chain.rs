//! Credential and authentication chaining across step-up steps.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::StepUpResolverError;
use crate::models::{Attributes, Authentication, Credential, Principal, value_to_collection};

/// Credentials and authentications accumulated during one login attempt.
///
/// The chain only grows. Every authentication belongs to the same principal
/// id; an append that would break this fails and leaves the chain as it was.
#[derive(Debug, Clone, Default)]
pub struct CredentialChain {
    credentials: Vec<(String, Credential)>,
    authentications: Vec<Authentication>,
}

impl CredentialChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an authentication without a credential.
    ///
    /// # Errors
    ///
    /// [`StepUpResolverError::IdentityMismatch`] if the principal differs
    /// from any authentication already chained.
    pub fn append(&mut self, authentication: Authentication) -> Result<(), StepUpResolverError> {
        self.check_principal(authentication.principal())?;
        self.authentications.push(authentication);
        Ok(())
    }

    /// Appends an authentication together with the credential that produced
    /// it. A credential already stored under `source_id` is replaced.
    ///
    /// # Errors
    ///
    /// [`StepUpResolverError::IdentityMismatch`] if the principal differs
    /// from any authentication already chained.
    pub fn append_with_credential(
        &mut self,
        authentication: Authentication,
        source_id: impl Into<String>,
        credential: Credential,
    ) -> Result<(), StepUpResolverError> {
        self.check_principal(authentication.principal())?;
        let source_id = source_id.into();
        if let Some(slot) = self.credentials.iter_mut().find(|(id, _)| *id == source_id) {
            slot.1 = credential;
        } else {
            self.credentials.push((source_id, credential));
        }
        self.authentications.push(authentication);
        Ok(())
    }

    fn check_principal(&self, principal: &Principal) -> Result<(), StepUpResolverError> {
        if let Some(existing) = self
            .authentications
            .iter()
            .find(|a| !a.principal().same_identity(principal))
        {
            tracing::warn!(
                expected = %existing.principal(),
                actual = %principal,
                "Principal does not match the authentication chain"
            );
            return Err(StepUpResolverError::IdentityMismatch {
                expected: existing.principal().id().to_owned(),
                actual: principal.id().to_owned(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authentications.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.authentications.len()
    }

    #[must_use]
    pub fn authentications(&self) -> &[Authentication] {
        &self.authentications
    }

    /// The first credential chained, usually the primary login credential.
    #[must_use]
    pub fn primary_credential(&self) -> Option<&Credential> {
        self.credentials.first().map(|(_, c)| c)
    }

    #[must_use]
    pub fn credential(&self, source_id: &str) -> Option<&Credential> {
        self.credentials
            .iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, c)| c)
    }

    /// Methods satisfied by any chained authentication.
    #[must_use]
    pub fn satisfied_methods(&self) -> BTreeSet<String> {
        self.authentications
            .iter()
            .flat_map(Authentication::satisfied_methods)
            .collect()
    }

    /// Merges the chain into one composite authentication.
    ///
    /// # Errors
    ///
    /// [`StepUpResolverError::EmptyChain`] if nothing has been chained.
    pub fn compose(&self) -> Result<CompositeAuthentication, StepUpResolverError> {
        let first = self
            .authentications
            .first()
            .ok_or(StepUpResolverError::EmptyChain)?;

        let mut principal_attributes = Attributes::new();
        let mut attributes = Attributes::new();
        for authentication in &self.authentications {
            for (name, value) in authentication.principal().attributes() {
                principal_attributes.insert(name.clone(), value.clone());
            }
            for (name, value) in authentication.attributes() {
                if let Some(existing) = attributes.get_mut(name) {
                    merge_into_set(existing, value);
                } else {
                    attributes.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(CompositeAuthentication {
            principal: Principal::with_attributes(first.principal().id(), principal_attributes),
            attributes,
            authenticated_at: Utc::now(),
            chained: self.authentications.clone(),
        })
    }
}

/// Turns `existing` into a set holding its elements and those of `incoming`.
/// Insertion order is kept and duplicates are dropped.
fn merge_into_set(existing: &mut Value, incoming: &Value) {
    let mut merged: Vec<Value> = Vec::new();
    for v in value_to_collection(existing)
        .into_iter()
        .chain(value_to_collection(incoming))
    {
        if !merged.contains(&v) {
            merged.push(v);
        }
    }
    *existing = Value::Array(merged);
}

/// Single identity produced from a credential chain.
#[derive(Debug, Clone)]
pub struct CompositeAuthentication {
    principal: Principal,
    attributes: Attributes,
    authenticated_at: DateTime<Utc>,
    chained: Vec<Authentication>,
}

impl CompositeAuthentication {
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    /// The authentications the composite was built from, in chain order.
    #[must_use]
    pub fn chained_authentications(&self) -> &[Authentication] {
        &self.chained
    }
}

impl From<CompositeAuthentication> for Authentication {
    fn from(composite: CompositeAuthentication) -> Self {
        Authentication::at(
            composite.principal,
            composite.attributes,
            composite.authenticated_at,
        )
    }
}
