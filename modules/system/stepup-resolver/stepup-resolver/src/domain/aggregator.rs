//! Runs the configured resolvers and merges their requests into a
//! transaction.

use std::sync::Arc;

use stepup_resolver_sdk::{MethodRequest, MethodSource, Transaction};

use super::error::DomainError;
use super::ranking::strongest;
use super::registry::MethodRegistry;
use super::resolvers::{MethodResolver, ResolutionContext};

#[derive(Debug)]
pub struct TransactionAggregator {
    registry: Arc<MethodRegistry>,
    resolvers: Vec<MethodResolver>,
}

impl TransactionAggregator {
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] if two resolvers share a source, since
    /// their requests could never coexist in one transaction.
    pub fn new(
        registry: Arc<MethodRegistry>,
        resolvers: Vec<MethodResolver>,
    ) -> Result<Self, DomainError> {
        for (i, resolver) in resolvers.iter().enumerate() {
            if let Some(other) = resolvers[..i]
                .iter()
                .find(|r| r.source() == resolver.source())
            {
                return Err(DomainError::InvalidConfig(format!(
                    "resolvers {:?} and {:?} both produce {} requests",
                    other.kind(),
                    resolver.kind(),
                    resolver.source()
                )));
            }
        }
        Ok(Self {
            registry,
            resolvers,
        })
    }

    #[must_use]
    pub fn resolvers(&self) -> &[MethodResolver] {
        &self.resolvers
    }

    /// Runs every resolver and gathers their requests.
    ///
    /// Returns `None` when no resolver asked for anything. The session
    /// authentication in `ctx`, if any, becomes the transaction's primary
    /// authentication.
    ///
    /// # Errors
    ///
    /// Resolver failures, and transaction invariant violations as
    /// [`DomainError::Rejected`].
    pub fn aggregate(
        &self,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Transaction>, DomainError> {
        let mut transaction: Option<Transaction> = None;
        for resolver in &self.resolvers {
            let Some(request) = self.resolve_one(resolver, ctx)? else {
                continue;
            };
            transaction
                .get_or_insert_with(|| Transaction::new(ctx.service_id()))
                .add_request(request)?;
        }

        if let (Some(tx), Some(authentication)) = (transaction.as_mut(), ctx.authentication) {
            tx.set_primary_authentication(authentication.clone());
        }
        tracing::debug!(
            service_id = ctx.service_id(),
            requests = transaction.as_ref().map_or(0, Transaction::len),
            "Method requests aggregated"
        );
        Ok(transaction)
    }

    /// The strongest request of the resolvers that read the principal.
    ///
    /// # Errors
    ///
    /// Resolver failures.
    pub fn resolve_principal(
        &self,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<MethodRequest>, DomainError> {
        let mut found = Vec::new();
        for resolver in self
            .resolvers
            .iter()
            .filter(|r| r.source() == MethodSource::PrincipalAttribute)
        {
            found.extend(self.resolve_one(resolver, ctx)?);
        }
        Ok(strongest(&self.registry, &found)?.cloned())
    }

    /// One resolver's requests collapsed to its strongest.
    fn resolve_one(
        &self,
        resolver: &MethodResolver,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<MethodRequest>, DomainError> {
        let requests = resolver.resolve(ctx)?;
        let best = strongest(&self.registry, &requests)?.cloned();
        if let Some(request) = &best {
            tracing::debug!(
                resolver = ?resolver.kind(),
                candidates = requests.len(),
                %request,
                "Resolver proposed a method"
            );
        }
        Ok(best)
    }
}
