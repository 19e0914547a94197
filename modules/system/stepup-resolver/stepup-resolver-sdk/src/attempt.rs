//! Conversation-scoped working state of one login attempt.

use uuid::Uuid;

use crate::chain::CredentialChain;
use crate::models::{Authentication, MethodRequest};
use crate::transaction::Transaction;

/// Where an attempt stands in the escalation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// No resolver produced a request.
    NoTransaction,
    /// A transaction exists and has not been decided yet.
    Evaluating,
    /// The decision was to continue without step-up.
    ContinueNormally,
    /// The decision was to require the named method.
    RequireMethod(String),
}

/// Working state for one login attempt. Owned by a single conversation.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    id: Uuid,
    state: AttemptState,
    transaction: Option<Transaction>,
    session_authentication: Option<Authentication>,
    selected: Option<MethodRequest>,
    chain: CredentialChain,
}

impl LoginAttempt {
    /// New attempt. The state follows from whether a transaction exists.
    #[must_use]
    pub fn new(
        transaction: Option<Transaction>,
        session_authentication: Option<Authentication>,
    ) -> Self {
        let state = if transaction.is_some() {
            AttemptState::Evaluating
        } else {
            AttemptState::NoTransaction
        };
        Self {
            id: Uuid::now_v7(),
            state,
            transaction,
            session_authentication,
            selected: None,
            chain: CredentialChain::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn set_state(&mut self, state: AttemptState) {
        self.state = state;
    }

    #[must_use]
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub fn transaction_mut(&mut self) -> Option<&mut Transaction> {
        self.transaction.as_mut()
    }

    /// Installs a transaction when the attempt started without one.
    pub fn set_transaction(&mut self, transaction: Transaction) {
        self.transaction = Some(transaction);
        if self.state == AttemptState::NoTransaction {
            self.state = AttemptState::Evaluating;
        }
    }

    /// Authentication of the existing session the attempt started from.
    #[must_use]
    pub fn session_authentication(&self) -> Option<&Authentication> {
        self.session_authentication.as_ref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&MethodRequest> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, request: MethodRequest) {
        self.state = AttemptState::RequireMethod(request.method().to_owned());
        self.selected = Some(request);
    }

    #[must_use]
    pub fn chain(&self) -> &CredentialChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut CredentialChain {
        &mut self.chain
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::MethodSource;

    #[test]
    fn state_follows_transaction_presence() {
        let attempt = LoginAttempt::new(None, None);
        assert_eq!(attempt.state(), &AttemptState::NoTransaction);

        let mut attempt = LoginAttempt::new(None, None);
        attempt.set_transaction(Transaction::new("svc"));
        assert_eq!(attempt.state(), &AttemptState::Evaluating);
    }

    #[test]
    fn select_moves_to_require_method() {
        let mut attempt = LoginAttempt::new(Some(Transaction::new("svc")), None);
        attempt.select(MethodRequest::new("duo", "svc", MethodSource::RequestParam));
        assert_eq!(attempt.state(), &AttemptState::RequireMethod("duo".to_owned()));
        assert_eq!(attempt.selected().map(MethodRequest::method), Some("duo"));
    }

    #[test]
    fn attempt_ids_are_unique() {
        let a = LoginAttempt::new(None, None);
        let b = LoginAttempt::new(None, None);
        assert_ne!(a.id(), b.id());
    }
}
