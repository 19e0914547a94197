use std::sync::Arc;

use stepup_resolver_sdk::{MethodRequest, MethodSource};

use super::ResolutionContext;
use crate::domain::error::DomainError;
use crate::domain::registry::MethodRegistry;
use crate::domain::translator::MethodTranslator;

/// Reads the explicit method parameter of the login request.
#[derive(Debug)]
pub struct RequestParameterResolver {
    registry: Arc<MethodRegistry>,
    translator: Arc<MethodTranslator>,
}

impl RequestParameterResolver {
    #[must_use]
    pub fn new(registry: Arc<MethodRegistry>, translator: Arc<MethodTranslator>) -> Self {
        Self {
            registry,
            translator,
        }
    }

    pub(super) fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Vec<MethodRequest>, DomainError> {
        let Some(value) = ctx
            .request
            .authn_method
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            return Ok(Vec::new());
        };

        let Some(method) = self.translator.translate(ctx.service_id(), value)? else {
            return Ok(Vec::new());
        };
        self.registry.require(&method)?;

        tracing::debug!(method = %method, "Method requested by request parameter");
        Ok(vec![MethodRequest::new(
            method,
            ctx.service_id(),
            MethodSource::RequestParam,
        )])
    }
}
