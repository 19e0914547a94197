use std::sync::Arc;

use stepup_resolver_sdk::{MethodRequest, MethodSource};

use super::ResolutionContext;
use crate::domain::error::DomainError;
use crate::domain::registry::MethodRegistry;
use crate::domain::translator::MethodTranslator;

/// Reads the method the target application declares.
///
/// An application with a role rule defers to [`super::RoleRuleResolver`].
/// An application that declares nothing gets the configured default method.
#[derive(Debug)]
pub struct ServiceDefinitionResolver {
    registry: Arc<MethodRegistry>,
    translator: Arc<MethodTranslator>,
    default_method: Option<String>,
}

impl ServiceDefinitionResolver {
    #[must_use]
    pub fn new(
        registry: Arc<MethodRegistry>,
        translator: Arc<MethodTranslator>,
        default_method: Option<String>,
    ) -> Self {
        Self {
            registry,
            translator,
            default_method: default_method.filter(|m| !m.trim().is_empty()),
        }
    }

    pub(super) fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Vec<MethodRequest>, DomainError> {
        let Some(service) = ctx.service else {
            return Ok(Vec::new());
        };
        if service.mfa_role.is_some() {
            tracing::debug!(service_id = %service.id, "Service declares a role rule; deferring");
            return Ok(Vec::new());
        }

        let declared = service
            .authn_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());
        let method = match declared {
            Some(value) => self.translator.translate(&service.id, value)?,
            None => self.default_method.clone(),
        };
        let Some(method) = method else {
            return Ok(Vec::new());
        };
        self.registry.require(&method)?;

        tracing::debug!(method = %method, service_id = %service.id, "Method declared by service");
        Ok(vec![MethodRequest::new(
            method,
            ctx.service_id(),
            MethodSource::RegisteredServiceDefinition,
        )])
    }
}
