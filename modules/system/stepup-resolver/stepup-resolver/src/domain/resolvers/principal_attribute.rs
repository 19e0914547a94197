use std::sync::Arc;

use stepup_resolver_sdk::models::string_values;
use stepup_resolver_sdk::{MethodRequest, MethodSource};

use super::ResolutionContext;
use crate::domain::error::DomainError;
use crate::domain::registry::MethodRegistry;
use crate::domain::translator::MethodTranslator;

/// Reads the required method from a principal attribute.
#[derive(Debug)]
pub struct PrincipalAttributeResolver {
    registry: Arc<MethodRegistry>,
    translator: Arc<MethodTranslator>,
    attribute: String,
}

impl PrincipalAttributeResolver {
    #[must_use]
    pub fn new(
        registry: Arc<MethodRegistry>,
        translator: Arc<MethodTranslator>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            translator,
            attribute: attribute.into(),
        }
    }

    pub(super) fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Vec<MethodRequest>, DomainError> {
        let Some(value) = ctx
            .authentication
            .and_then(|a| a.principal().attribute(&self.attribute))
        else {
            return Ok(Vec::new());
        };

        let mut requests = Vec::new();
        for raw in string_values(value) {
            let Some(method) = self.translator.translate(ctx.service_id(), raw)? else {
                continue;
            };
            if !self.registry.contains(&method) {
                tracing::info!(
                    method = %method,
                    attribute = %self.attribute,
                    "Principal attribute names an unregistered method; skipping"
                );
                continue;
            }
            requests.push(MethodRequest::new(
                method,
                ctx.service_id(),
                MethodSource::PrincipalAttribute,
            ));
        }
        tracing::debug!(
            attribute = %self.attribute,
            count = requests.len(),
            "Methods requested by principal attribute"
        );
        Ok(requests)
    }
}
