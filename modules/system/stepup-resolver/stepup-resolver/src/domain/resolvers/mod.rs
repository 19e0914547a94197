//! Method resolvers.
//!
//! Each resolver reads one source of method requirements and proposes
//! requests for the target service of the login attempt.

mod principal_attribute;
mod request_param;
mod role_rule;
mod service_definition;

use stepup_resolver_sdk::{
    Authentication, LoginRequest, MethodRequest, MethodSource, RegisteredService,
};

pub use principal_attribute::PrincipalAttributeResolver;
pub use request_param::RequestParameterResolver;
pub use role_rule::RoleRuleResolver;
pub use service_definition::ServiceDefinitionResolver;

use super::error::DomainError;
use crate::config::ResolverKind;

/// Inputs available to resolvers for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub request: &'a LoginRequest,
    pub authentication: Option<&'a Authentication>,
    pub service: Option<&'a RegisteredService>,
}

impl<'a> ResolutionContext<'a> {
    #[must_use]
    pub fn new(request: &'a LoginRequest) -> Self {
        Self {
            request,
            authentication: None,
            service: None,
        }
    }

    #[must_use]
    pub fn with_authentication(mut self, authentication: Option<&'a Authentication>) -> Self {
        self.authentication = authentication;
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: Option<&'a RegisteredService>) -> Self {
        self.service = service;
        self
    }

    #[must_use]
    pub fn service_id(&self) -> &'a str {
        &self.request.service_id
    }
}

/// The configured resolvers.
#[derive(Debug)]
pub enum MethodResolver {
    RequestParameter(RequestParameterResolver),
    ServiceDefinition(ServiceDefinitionResolver),
    RoleRule(RoleRuleResolver),
    PrincipalAttribute(PrincipalAttributeResolver),
}

impl MethodResolver {
    #[must_use]
    pub fn kind(&self) -> ResolverKind {
        match self {
            Self::RequestParameter(_) => ResolverKind::RequestParameter,
            Self::ServiceDefinition(_) => ResolverKind::ServiceDefinition,
            Self::RoleRule(_) => ResolverKind::RoleRule,
            Self::PrincipalAttribute(_) => ResolverKind::PrincipalAttribute,
        }
    }

    #[must_use]
    pub fn source(&self) -> MethodSource {
        match self {
            Self::RequestParameter(_) => MethodSource::RequestParam,
            Self::ServiceDefinition(_) => MethodSource::RegisteredServiceDefinition,
            Self::RoleRule(_) | Self::PrincipalAttribute(_) => MethodSource::PrincipalAttribute,
        }
    }

    /// Requests proposed for `ctx`. Empty when the source says nothing.
    ///
    /// # Errors
    ///
    /// - [`DomainError::UnregisteredMethod`] if an explicitly requested or
    ///   declared method is not registered
    /// - [`DomainError::UnrecognizedMethod`] if a value cannot be translated
    /// - [`DomainError::InvalidPattern`] if a role pattern does not compile
    pub fn resolve(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<MethodRequest>, DomainError> {
        match self {
            Self::RequestParameter(r) => r.resolve(ctx),
            Self::ServiceDefinition(r) => r.resolve(ctx),
            Self::RoleRule(r) => r.resolve(ctx),
            Self::PrincipalAttribute(r) => r.resolve(ctx),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod test_support {
    use std::sync::Arc;

    use stepup_resolver_sdk::{Attributes, Authentication, Principal};

    use crate::domain::registry::MethodRegistry;

    pub const SVC: &str = "https://app.example.org";

    pub fn registry() -> Arc<MethodRegistry> {
        Arc::new(MethodRegistry::from_ranks([("duo", 1), ("otp", 2)]).unwrap())
    }

    /// Authentication of "alice" with the given principal attributes.
    pub fn authentication(attributes: &[(&str, serde_json::Value)]) -> Authentication {
        let attributes: Attributes = attributes
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        Authentication::new(Principal::with_attributes("alice", attributes))
    }
}
