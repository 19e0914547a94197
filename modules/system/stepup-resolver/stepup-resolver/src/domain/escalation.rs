//! The step-up decision for one login attempt.

use std::sync::Arc;

use stepup_resolver_sdk::{Authentication, EscalationDecision, Transaction};

use super::error::DomainError;
use super::ranking::RankingStrategy;

/// What the decision looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalationInput<'a> {
    pub transaction: Option<&'a Transaction>,
    /// The request carried an existing session id.
    pub has_session: bool,
    /// Authentication bound to that session, if the session is still live.
    pub session_authentication: Option<&'a Authentication>,
    /// The caller forced re-authentication.
    pub renew: bool,
}

pub struct EscalationEvaluator {
    ranking: Arc<dyn RankingStrategy>,
}

impl EscalationEvaluator {
    #[must_use]
    pub fn new(ranking: Arc<dyn RankingStrategy>) -> Self {
        Self { ranking }
    }

    /// Decides whether the attempt continues normally or steps up.
    ///
    /// Without an existing session the attempt always continues; the
    /// requirement is enforced after primary login. A forced renew also
    /// continues even when the session is too weak.
    ///
    /// # Errors
    ///
    /// [`DomainError::UnregisteredMethod`] if ranking meets an unknown method.
    pub fn decide(&self, input: &EscalationInput<'_>) -> Result<EscalationDecision, DomainError> {
        let Some(transaction) = input.transaction else {
            tracing::debug!("No method requests; continuing");
            return Ok(EscalationDecision::ContinueNormally);
        };
        let Some(required) = self.ranking.highest_ranking(transaction)? else {
            tracing::debug!("Transaction has no requests; continuing");
            return Ok(EscalationDecision::ContinueNormally);
        };
        if !input.has_session {
            tracing::debug!(
                method = required.method(),
                "No existing session; deferring to primary login"
            );
            return Ok(EscalationDecision::ContinueNormally);
        }
        if required.method().trim().is_empty() {
            return Ok(EscalationDecision::ContinueNormally);
        }

        let Some(authentication) = input.session_authentication else {
            tracing::warn!(
                method = required.method(),
                "Session has no authentication; requiring method"
            );
            return Ok(EscalationDecision::RequireMethod(required));
        };

        let satisfied = authentication.satisfied_methods();
        if self
            .ranking
            .is_any_already_satisfied_stronger_or_equal(&satisfied, required.method())?
        {
            tracing::debug!(
                method = required.method(),
                ?satisfied,
                "Session already satisfies a method at least as strong"
            );
            return Ok(EscalationDecision::ContinueNormally);
        }
        if input.renew {
            tracing::debug!(method = required.method(), "Renew requested; continuing");
            return Ok(EscalationDecision::ContinueNormally);
        }

        tracing::debug!(%required, "Step-up required");
        Ok(EscalationDecision::RequireMethod(required))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;
    use stepup_resolver_sdk::{
        AUTHN_METHOD_ATTRIBUTE, Attributes, MethodRequest, MethodSource, Principal,
    };

    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::ranking::OrderedRankingStrategy;
    use crate::domain::registry::MethodRegistry;

    const SVC: &str = "svc";

    fn evaluator() -> EscalationEvaluator {
        let registry = Arc::new(MethodRegistry::from_ranks([("duo", 1), ("otp", 2)]).unwrap());
        EscalationEvaluator::new(Arc::new(OrderedRankingStrategy::new(registry)))
    }

    fn requesting(method: &str) -> Transaction {
        Transaction::from_request(MethodRequest::new(method, SVC, MethodSource::RequestParam))
    }

    fn satisfied_with(method: &str) -> Authentication {
        let attributes: Attributes = [(AUTHN_METHOD_ATTRIBUTE.to_owned(), json!(method))]
            .into_iter()
            .collect();
        Authentication::with_attributes(Principal::new("alice"), attributes)
    }

    /// Always proposes a request with a blank method.
    struct BlankMethodStrategy;

    impl RankingStrategy for BlankMethodStrategy {
        fn highest_ranking(
            &self,
            _transaction: &Transaction,
        ) -> Result<Option<MethodRequest>, DomainError> {
            Ok(Some(MethodRequest::new("  ", SVC, MethodSource::RequestParam)))
        }

        fn is_any_already_satisfied_stronger_or_equal(
            &self,
            _satisfied: &BTreeSet<String>,
            _requested: &str,
        ) -> Result<bool, DomainError> {
            Ok(false)
        }
    }

    #[test]
    fn blank_required_method_continues() {
        let tx = requesting("duo");
        let decision = EscalationEvaluator::new(Arc::new(BlankMethodStrategy))
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                ..EscalationInput::default()
            })
            .unwrap();
        assert_eq!(decision, EscalationDecision::ContinueNormally);
    }

    #[test]
    fn no_transaction_continues() {
        let decision = evaluator().decide(&EscalationInput::default()).unwrap();
        assert_eq!(decision, EscalationDecision::ContinueNormally);
    }

    #[test]
    fn empty_transaction_continues() {
        let tx = Transaction::new(SVC);
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                ..EscalationInput::default()
            })
            .unwrap();
        assert_eq!(decision, EscalationDecision::ContinueNormally);
    }

    #[test]
    fn stronger_session_method_continues() {
        let tx = requesting("otp");
        let auth = satisfied_with("duo");
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                session_authentication: Some(&auth),
                renew: false,
            })
            .unwrap();
        assert_eq!(decision, EscalationDecision::ContinueNormally);
    }

    #[test]
    fn weaker_session_method_requires_step_up() {
        let tx = requesting("duo");
        let auth = satisfied_with("otp");
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                session_authentication: Some(&auth),
                renew: false,
            })
            .unwrap();
        assert_eq!(decision.required_method(), Some("duo"));
        assert_eq!(decision.event_id(), "mfa_duo");
    }

    #[test]
    fn missing_session_defers_enforcement() {
        let tx = requesting("duo");
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                ..EscalationInput::default()
            })
            .unwrap();
        assert_eq!(decision, EscalationDecision::ContinueNormally);
    }

    #[test]
    fn broken_session_escalates() {
        let tx = requesting("otp");
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                ..EscalationInput::default()
            })
            .unwrap();
        assert_eq!(decision.required_method(), Some("otp"));
    }

    #[test]
    fn renew_wins_over_step_up() {
        let tx = requesting("duo");
        let auth = satisfied_with("otp");
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                session_authentication: Some(&auth),
                renew: true,
            })
            .unwrap();
        assert_eq!(decision, EscalationDecision::ContinueNormally);
    }

    #[test]
    fn session_without_recorded_method_requires_step_up() {
        let tx = requesting("otp");
        let auth = Authentication::new(Principal::new("alice"));
        let decision = evaluator()
            .decide(&EscalationInput {
                transaction: Some(&tx),
                has_session: true,
                session_authentication: Some(&auth),
                renew: false,
            })
            .unwrap();
        assert_eq!(decision.required_method(), Some("otp"));
    }
}
