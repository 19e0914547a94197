//! Domain service for the step-up resolver.

use std::slice;
use std::sync::Arc;

use serde_json::Value;
use stepup_resolver_sdk::{
    AUTHN_METHOD_ATTRIBUTE, AttemptState, Authentication, Credential, CredentialChain,
    EscalationDecision, LoginAttempt, LoginRequest, MethodRequest, ServiceRegistry, SessionStore,
    StepOutcome, StepUpResolverError, Transaction,
};

use super::aggregator::TransactionAggregator;
use super::error::DomainError;
use super::escalation::{EscalationEvaluator, EscalationInput};
use super::pattern_cache::PatternCache;
use super::ranking::{OrderedRankingStrategy, RankingStrategy};
use super::registry::MethodRegistry;
use super::resolvers::{
    MethodResolver, PrincipalAttributeResolver, RequestParameterResolver, ResolutionContext,
    RoleRuleResolver, ServiceDefinitionResolver,
};
use super::service_registry::StaticServiceRegistry;
use super::translator::MethodTranslator;
use super::validation::ValidationSpecification;
use crate::config::{ResolverKind, StepUpResolverConfig};

/// Credential source id of the primary login step.
pub const PRIMARY_CREDENTIAL_SOURCE: &str = "primary";

/// Step-up resolver service.
pub struct Service {
    registry: Arc<MethodRegistry>,
    ranking: Arc<dyn RankingStrategy>,
    aggregator: TransactionAggregator,
    evaluator: EscalationEvaluator,
    sessions: Arc<dyn SessionStore>,
    services: Arc<dyn ServiceRegistry>,
}

impl Service {
    /// Builds the service with the static service registry from `config`.
    ///
    /// # Errors
    ///
    /// Same as [`Service::new`].
    pub fn from_config(
        config: &StepUpResolverConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, DomainError> {
        let services = Arc::new(StaticServiceRegistry::new(config.services.iter().cloned()));
        Self::new(config, sessions, services)
    }

    /// # Errors
    ///
    /// - [`DomainError::InvalidConfig`] if the method registry cannot be
    ///   assembled or two resolvers share a source
    /// - [`DomainError::InvalidPattern`] if a translator pattern is invalid
    pub fn new(
        config: &StepUpResolverConfig,
        sessions: Arc<dyn SessionStore>,
        services: Arc<dyn ServiceRegistry>,
    ) -> Result<Self, DomainError> {
        let registry = Arc::new(MethodRegistry::from_config(config)?);
        let patterns = Arc::new(PatternCache::new());
        let translator = Arc::new(MethodTranslator::new(
            config.translator.clone(),
            Arc::clone(&patterns),
        )?);

        let resolvers = config
            .resolvers
            .iter()
            .map(|kind| build_resolver(*kind, config, &registry, &translator, &patterns))
            .collect();
        let aggregator = TransactionAggregator::new(Arc::clone(&registry), resolvers)?;
        let ranking: Arc<dyn RankingStrategy> =
            Arc::new(OrderedRankingStrategy::new(Arc::clone(&registry)));

        tracing::info!(
            methods = registry.len(),
            resolvers = ?config.resolvers,
            "stepup_resolver service initialized"
        );
        Ok(Self {
            registry,
            evaluator: EscalationEvaluator::new(Arc::clone(&ranking)),
            ranking,
            aggregator,
            sessions,
            services,
        })
    }

    /// Replaces the ranking strategy.
    #[must_use]
    pub fn with_ranking_strategy(mut self, ranking: Arc<dyn RankingStrategy>) -> Self {
        self.evaluator = EscalationEvaluator::new(Arc::clone(&ranking));
        self.ranking = ranking;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Starts an attempt and gathers its method requests.
    ///
    /// # Errors
    ///
    /// Resolver failures and transaction invariant violations.
    #[tracing::instrument(
        skip_all,
        fields(service_id = %request.service_id, attempt_id = tracing::field::Empty)
    )]
    pub fn begin(&self, request: &LoginRequest) -> Result<LoginAttempt, DomainError> {
        let session_authentication = request
            .session()
            .and_then(|id| self.sessions.authentication(id));
        let service = self.services.find(&request.service_id);
        let ctx = ResolutionContext::new(request)
            .with_authentication(session_authentication.as_ref())
            .with_service(service.as_ref());

        let transaction = self.aggregator.aggregate(&ctx)?;
        let attempt = LoginAttempt::new(transaction, session_authentication);
        tracing::Span::current().record("attempt_id", tracing::field::display(attempt.id()));
        tracing::debug!(state = ?attempt.state(), "Login attempt started");
        Ok(attempt)
    }

    /// Runs the escalation decision and records its outcome in `attempt`.
    ///
    /// # Errors
    ///
    /// [`DomainError::UnregisteredMethod`] if ranking meets an unknown method.
    #[tracing::instrument(
        skip_all,
        fields(service_id = %request.service_id, attempt_id = %attempt.id())
    )]
    pub fn evaluate(
        &self,
        attempt: &mut LoginAttempt,
        request: &LoginRequest,
    ) -> Result<EscalationDecision, DomainError> {
        let decision = self.evaluator.decide(&EscalationInput {
            transaction: attempt.transaction(),
            has_session: request.session().is_some(),
            session_authentication: attempt.session_authentication(),
            renew: request.renew,
        })?;

        match &decision {
            EscalationDecision::ContinueNormally => {
                attempt.set_state(AttemptState::ContinueNormally);
            }
            EscalationDecision::RequireMethod(required) => {
                attempt.select(required.clone());
                if attempt.chain().is_empty()
                    && let Some(session) = attempt.session_authentication().cloned()
                {
                    attempt.chain_mut().append(session)?;
                }
            }
        }
        tracing::debug!(event_id = %decision.event_id(), "Escalation decided");
        Ok(decision)
    }

    /// Chains the primary authentication.
    ///
    /// When no method has been selected yet, the principal-driven resolvers
    /// run against `authentication` and the strongest request of the
    /// transaction becomes the selection.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Rejected`] with `IdentityMismatch` if the principal
    ///   differs from the chain, or `DuplicateSource` /
    ///   `TargetServiceMismatch` if the request found after login does not
    ///   fit the transaction
    /// - Resolver and ranking failures
    ///
    /// On error the attempt is left unchanged.
    #[tracing::instrument(
        skip_all,
        fields(service_id = %request.service_id, attempt_id = %attempt.id())
    )]
    pub fn complete_primary(
        &self,
        attempt: &mut LoginAttempt,
        request: &LoginRequest,
        authentication: Authentication,
        credential: Option<Credential>,
    ) -> Result<StepOutcome, DomainError> {
        let resolved = if attempt.selected().is_none() {
            let service = self.services.find(&request.service_id);
            let ctx = ResolutionContext::new(request)
                .with_authentication(Some(&authentication))
                .with_service(service.as_ref());
            self.aggregator.resolve_principal(&ctx)?
        } else {
            None
        };

        let staged = resolved
            .map(|found| staged_transaction(attempt.transaction(), found))
            .transpose()?;

        let primary = authentication.clone();
        chain_step(
            attempt.chain_mut(),
            authentication,
            PRIMARY_CREDENTIAL_SOURCE,
            credential,
        )?;

        if let Some(tx) = staged {
            attempt.set_transaction(tx);
        }
        if let Some(tx) = attempt.transaction_mut()
            && tx.primary_authentication().is_none()
        {
            tx.set_primary_authentication(primary);
        }
        if attempt.selected().is_none()
            && let Some(best) = attempt
                .transaction()
                .map(|tx| self.ranking.highest_ranking(tx))
                .transpose()?
                .flatten()
        {
            tracing::debug!(%best, "Method selected after primary login");
            attempt.select(best);
        }

        self.outcome(attempt)
    }

    /// Chains the authentication produced by the selected method, recording
    /// the method on it.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Rejected`] with `NoMethodSelected` if nothing was
    ///   selected, or `IdentityMismatch` if the principal differs
    #[tracing::instrument(skip_all, fields(attempt_id = %attempt.id()))]
    pub fn complete_method(
        &self,
        attempt: &mut LoginAttempt,
        mut authentication: Authentication,
        credential: Option<Credential>,
    ) -> Result<StepOutcome, DomainError> {
        let selected = attempt
            .selected()
            .cloned()
            .ok_or(StepUpResolverError::NoMethodSelected)?;
        authentication.set_attribute(
            AUTHN_METHOD_ATTRIBUTE,
            Value::String(selected.method().to_owned()),
        );
        chain_step(
            attempt.chain_mut(),
            authentication,
            selected.method(),
            credential,
        )?;
        tracing::debug!(method = selected.method(), "Method completed");
        self.outcome(attempt)
    }

    /// Composes the chain and validates it against the selected method.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Rejected`] with `EmptyChain` if nothing was chained
    /// - [`DomainError::UnacceptableMethod`] / [`DomainError::UnrecognizedMethod`]
    ///   if the selected method was not completed
    #[tracing::instrument(skip_all, fields(attempt_id = %attempt.id()))]
    pub fn finish(&self, attempt: &LoginAttempt) -> Result<Authentication, DomainError> {
        let authentication: Authentication = attempt.chain().compose()?.into();

        let spec = match attempt.selected() {
            Some(selected) if !self.covers(attempt.chain(), selected)? => {
                ValidationSpecification::new(Some(selected.method().to_owned()))
                    .for_service(selected.target_service_id())
            }
            _ => ValidationSpecification::new(None),
        };
        if !spec.is_satisfied_by(slice::from_ref(&authentication))? {
            return Err(DomainError::ValidationFailed(
                "composite authentication was rejected".to_owned(),
            ));
        }

        tracing::debug!(
            principal = %authentication.principal(),
            steps = attempt.chain().len(),
            "Login attempt finished"
        );
        Ok(authentication)
    }

    fn outcome(&self, attempt: &LoginAttempt) -> Result<StepOutcome, DomainError> {
        match attempt.selected() {
            Some(selected) if !self.covers(attempt.chain(), selected)? => {
                Ok(StepOutcome::RequireMethod(selected.clone()))
            }
            _ => Ok(StepOutcome::Completed),
        }
    }

    fn covers(
        &self,
        chain: &CredentialChain,
        selected: &MethodRequest,
    ) -> Result<bool, DomainError> {
        self.ranking.is_any_already_satisfied_stronger_or_equal(
            &chain.satisfied_methods(),
            selected.method(),
        )
    }
}

fn build_resolver(
    kind: ResolverKind,
    config: &StepUpResolverConfig,
    registry: &Arc<MethodRegistry>,
    translator: &Arc<MethodTranslator>,
    patterns: &Arc<PatternCache>,
) -> MethodResolver {
    let principal_attribute = || {
        PrincipalAttributeResolver::new(
            Arc::clone(registry),
            Arc::clone(translator),
            config.principal_attribute.clone(),
        )
    };
    match kind {
        ResolverKind::RequestParameter => MethodResolver::RequestParameter(
            RequestParameterResolver::new(Arc::clone(registry), Arc::clone(translator)),
        ),
        ResolverKind::ServiceDefinition => {
            MethodResolver::ServiceDefinition(ServiceDefinitionResolver::new(
                Arc::clone(registry),
                Arc::clone(translator),
                config.default_method.clone(),
            ))
        }
        ResolverKind::RoleRule => MethodResolver::RoleRule(RoleRuleResolver::new(
            Arc::clone(registry),
            Arc::clone(patterns),
            principal_attribute(),
        )),
        ResolverKind::PrincipalAttribute => {
            MethodResolver::PrincipalAttribute(principal_attribute())
        }
    }
}

fn chain_step(
    chain: &mut CredentialChain,
    authentication: Authentication,
    source_id: &str,
    credential: Option<Credential>,
) -> Result<(), StepUpResolverError> {
    match credential {
        Some(credential) => chain.append_with_credential(authentication, source_id, credential),
        None => chain.append(authentication),
    }
}

/// The attempt's transaction with a request found after primary login.
///
/// A request from a source the transaction already holds is rejected with
/// `DuplicateSource`.
fn staged_transaction(
    current: Option<&Transaction>,
    request: MethodRequest,
) -> Result<Transaction, DomainError> {
    let Some(current) = current else {
        return Ok(Transaction::from_request(request));
    };
    let mut tx = current.clone();
    tx.add_request(request)?;
    Ok(tx)
}
