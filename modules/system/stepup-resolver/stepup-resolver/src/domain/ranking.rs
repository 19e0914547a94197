//! Ranking of requested and satisfied methods.

use std::collections::BTreeSet;
use std::sync::Arc;

use stepup_resolver_sdk::{MethodRequest, Transaction};

use super::error::DomainError;
use super::registry::MethodRegistry;

/// Picks the request that has to be honored and compares methods that were
/// already satisfied against a requested one.
pub trait RankingStrategy: Send + Sync {
    /// The request to honor for `transaction`, or `None` when it is empty.
    ///
    /// # Errors
    ///
    /// [`DomainError::UnregisteredMethod`] if a requested method is unknown.
    fn highest_ranking(&self, transaction: &Transaction)
    -> Result<Option<MethodRequest>, DomainError>;

    /// Whether any of `satisfied` ranks at least as strong as `requested`.
    /// Always `false` for an empty set.
    ///
    /// # Errors
    ///
    /// [`DomainError::UnregisteredMethod`] if any name involved is unknown.
    fn is_any_already_satisfied_stronger_or_equal(
        &self,
        satisfied: &BTreeSet<String>,
        requested: &str,
    ) -> Result<bool, DomainError>;
}

/// Ranks by registry rank.
///
/// Requests sharing the lowest rank are ordered by method name, then by
/// source (request parameter, principal attribute, service definition).
#[derive(Debug, Clone)]
pub struct OrderedRankingStrategy {
    registry: Arc<MethodRegistry>,
}

impl OrderedRankingStrategy {
    #[must_use]
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }
}

impl RankingStrategy for OrderedRankingStrategy {
    fn highest_ranking(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<MethodRequest>, DomainError> {
        Ok(strongest(&self.registry, transaction.requests())?.cloned())
    }

    fn is_any_already_satisfied_stronger_or_equal(
        &self,
        satisfied: &BTreeSet<String>,
        requested: &str,
    ) -> Result<bool, DomainError> {
        if satisfied.is_empty() {
            return Ok(false);
        }
        let requested = self.registry.require(requested)?;
        for name in satisfied {
            if self.registry.require(name)?.is_at_least_as_strong_as(requested) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Strongest request of `requests` under the ordering described on
/// [`OrderedRankingStrategy`].
///
/// # Errors
///
/// [`DomainError::UnregisteredMethod`] if a requested method is unknown.
pub fn strongest<'a>(
    registry: &MethodRegistry,
    requests: impl IntoIterator<Item = &'a MethodRequest>,
) -> Result<Option<&'a MethodRequest>, DomainError> {
    let mut best: Option<(i32, &MethodRequest)> = None;
    for request in requests {
        let rank = registry.rank(request.method())?;
        let better = match best {
            None => true,
            Some((best_rank, current)) => {
                (rank, request.method(), request.source())
                    < (best_rank, current.method(), current.source())
            }
        };
        if better {
            best = Some((rank, request));
        }
    }
    Ok(best.map(|(_, r)| r))
}
