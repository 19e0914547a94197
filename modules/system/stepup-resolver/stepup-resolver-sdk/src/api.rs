//! Public API trait for the step-up resolver.
//!
//! The flow engine drives one login attempt through this trait: begin the
//! attempt, ask for the escalation decision, chain each completed step and
//! finally obtain the composite authentication.

use crate::attempt::LoginAttempt;
use crate::error::StepUpResolverError;
use crate::models::{Authentication, Credential, EscalationDecision, LoginRequest, StepOutcome};

/// Public API trait for the step-up resolver.
///
/// ```ignore
/// let mut attempt = stepup.begin(&request)?;
/// match stepup.evaluate(&mut attempt, &request)? {
///     EscalationDecision::ContinueNormally => { /* primary login */ }
///     EscalationDecision::RequireMethod(req) => { /* enter mfa_<method> */ }
/// }
/// ```
pub trait StepUpResolverClient: Send + Sync {
    /// Starts an attempt and gathers the method requests for it.
    ///
    /// # Errors
    ///
    /// - `UnregisteredMethod` if a requested method is not registered
    /// - `UnrecognizedMethod` if a value cannot be translated to a method
    /// - `TargetServiceMismatch` / `DuplicateSource` on transaction conflicts
    fn begin(&self, request: &LoginRequest) -> Result<LoginAttempt, StepUpResolverError>;

    /// Decides whether the attempt continues normally or requires a method.
    ///
    /// # Errors
    ///
    /// - `UnregisteredMethod` if a ranked method is not registered
    /// - `IdentityMismatch` if seeding the chain fails
    fn evaluate(
        &self,
        attempt: &mut LoginAttempt,
        request: &LoginRequest,
    ) -> Result<EscalationDecision, StepUpResolverError>;

    /// Chains the primary authentication.
    ///
    /// # Errors
    ///
    /// - `IdentityMismatch` if the principal differs from the chain
    /// - Resolution errors if principal-driven resolvers fail
    fn complete_primary(
        &self,
        attempt: &mut LoginAttempt,
        request: &LoginRequest,
        authentication: Authentication,
        credential: Option<Credential>,
    ) -> Result<StepOutcome, StepUpResolverError>;

    /// Chains the authentication produced by the selected method.
    ///
    /// # Errors
    ///
    /// - `NoMethodSelected` if the attempt has no selection
    /// - `IdentityMismatch` if the principal differs from the chain
    fn complete_method(
        &self,
        attempt: &mut LoginAttempt,
        authentication: Authentication,
        credential: Option<Credential>,
    ) -> Result<StepOutcome, StepUpResolverError>;

    /// Composes and validates the chain.
    ///
    /// # Errors
    ///
    /// - `EmptyChain` if nothing was chained
    /// - `UnacceptableMethod` / `UnrecognizedMethod` if the required method
    ///   was not completed
    fn finish(&self, attempt: &LoginAttempt) -> Result<Authentication, StepUpResolverError>;
}
