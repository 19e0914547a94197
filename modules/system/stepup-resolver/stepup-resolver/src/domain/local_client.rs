//! Local (in-process) client for the step-up resolver.

use std::sync::Arc;

use stepup_resolver_sdk::{
    Authentication, Credential, EscalationDecision, LoginAttempt, LoginRequest, StepOutcome,
    StepUpResolverClient, StepUpResolverError,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
pub struct StepUpResolverLocalClient {
    svc: Arc<Service>,
}

impl StepUpResolverLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> StepUpResolverError {
    tracing::error!(operation = op, error = ?e, "stepup_resolver call failed");
    e.into()
}

impl StepUpResolverClient for StepUpResolverLocalClient {
    fn begin(&self, request: &LoginRequest) -> Result<LoginAttempt, StepUpResolverError> {
        self.svc
            .begin(request)
            .map_err(|e| log_and_convert("begin", e))
    }

    fn evaluate(
        &self,
        attempt: &mut LoginAttempt,
        request: &LoginRequest,
    ) -> Result<EscalationDecision, StepUpResolverError> {
        self.svc
            .evaluate(attempt, request)
            .map_err(|e| log_and_convert("evaluate", e))
    }

    fn complete_primary(
        &self,
        attempt: &mut LoginAttempt,
        request: &LoginRequest,
        authentication: Authentication,
        credential: Option<Credential>,
    ) -> Result<StepOutcome, StepUpResolverError> {
        self.svc
            .complete_primary(attempt, request, authentication, credential)
            .map_err(|e| log_and_convert("complete_primary", e))
    }

    fn complete_method(
        &self,
        attempt: &mut LoginAttempt,
        authentication: Authentication,
        credential: Option<Credential>,
    ) -> Result<StepOutcome, StepUpResolverError> {
        self.svc
            .complete_method(attempt, authentication, credential)
            .map_err(|e| log_and_convert("complete_method", e))
    }

    fn finish(&self, attempt: &LoginAttempt) -> Result<Authentication, StepUpResolverError> {
        self.svc
            .finish(attempt)
            .map_err(|e| log_and_convert("finish", e))
    }
}
