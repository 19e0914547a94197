use std::sync::Arc;

use stepup_resolver_sdk::models::string_values;
use stepup_resolver_sdk::{MethodRequest, MethodSource};

use super::{PrincipalAttributeResolver, ResolutionContext};
use crate::domain::error::DomainError;
use crate::domain::pattern_cache::PatternCache;
use crate::domain::registry::MethodRegistry;

/// Requires the application's method when a principal attribute matches the
/// application's role pattern.
///
/// Without a complete rule, or when nothing matches, the principal attribute
/// resolver decides instead.
#[derive(Debug)]
pub struct RoleRuleResolver {
    registry: Arc<MethodRegistry>,
    patterns: Arc<PatternCache>,
    fallback: PrincipalAttributeResolver,
}

impl RoleRuleResolver {
    #[must_use]
    pub fn new(
        registry: Arc<MethodRegistry>,
        patterns: Arc<PatternCache>,
        fallback: PrincipalAttributeResolver,
    ) -> Self {
        Self {
            registry,
            patterns,
            fallback,
        }
    }

    pub(super) fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Vec<MethodRequest>, DomainError> {
        let requests = self.resolve_rule(ctx)?;
        if requests.is_empty() {
            return self.fallback.resolve(ctx);
        }
        Ok(requests)
    }

    fn resolve_rule(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<MethodRequest>, DomainError> {
        let Some(authentication) = ctx.authentication else {
            return Ok(Vec::new());
        };
        let Some(service) = ctx.service else {
            return Ok(Vec::new());
        };
        let (Some(rule), Some(method)) = (&service.mfa_role, service.authn_method.as_deref()) else {
            return Ok(Vec::new());
        };
        let (Some(attribute), Some(pattern)) = (
            rule.attribute_name.as_deref(),
            rule.attribute_pattern.as_deref(),
        ) else {
            tracing::debug!(service_id = %service.id, "Incomplete role rule");
            return Ok(Vec::new());
        };
        let Some(value) = authentication.principal().attribute(attribute) else {
            return Ok(Vec::new());
        };

        let mut requests = Vec::new();
        for candidate in string_values(value) {
            if !self.patterns.full_match(pattern, candidate)? {
                continue;
            }
            if !self.registry.contains(method) {
                tracing::info!(
                    method,
                    service_id = %service.id,
                    "Role rule names an unregistered method; skipping"
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
            attribute,
            pattern,
            count = requests.len(),
            "Role rule evaluated"
        );
        Ok(requests)
    }
}
