//! Error types for the step-up resolver module.

use thiserror::Error;

use crate::models::MethodSource;

/// Errors surfaced to the flow engine by the step-up resolver API.
///
/// Every variant maps to a distinct user-facing outcome. Use
/// [`StepUpResolverError::is_recoverable`] to tell per-attempt failures
/// (the user may start over) from deployment mistakes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepUpResolverError {
    /// The method is not present in the method registry.
    #[error("authentication method '{method}' is not registered")]
    UnregisteredMethod { method: String },

    /// The final authentication carries no method at all, so the required
    /// method was never completed.
    #[error("requested authentication method '{method}' is not available")]
    UnacceptableMethod { method: String },

    /// The authentication carries a method, but not the one that was
    /// required, or a method value could not be mapped to a known method.
    #[error(
        "authentication method '{method}' is not recognized{}",
        service_suffix(.service_id.as_deref())
    )]
    UnrecognizedMethod {
        method: String,
        service_id: Option<String>,
    },

    /// A request targets a different service than its transaction.
    #[error(
        "requested target service '{actual}' differs from the transaction target service '{expected}'"
    )]
    TargetServiceMismatch { expected: String, actual: String },

    /// The transaction already holds a request from this source.
    #[error("a method request from source {method_source} already exists")]
    DuplicateSource { method_source: MethodSource },

    /// A chain step authenticated a different principal than earlier steps.
    #[error("principal '{actual}' does not match the authentication chain principal '{expected}'")]
    IdentityMismatch { expected: String, actual: String },

    /// The chain has no authentication to compose.
    #[error("authentication chain is empty")]
    EmptyChain,

    /// A step-up step was completed while no method was selected.
    #[error("no authentication method has been selected for this attempt")]
    NoMethodSelected,

    /// The resolver configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

fn service_suffix(service_id: Option<&str>) -> String {
    service_id.map_or_else(String::new, |id| format!(" for service '{id}'"))
}

impl StepUpResolverError {
    /// Returns `true` when the attempt may be retried from the beginning.
    ///
    /// Protocol and chain-integrity failures are recoverable. Registry,
    /// configuration and transaction-invariant failures are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnacceptableMethod { .. }
                | Self::UnrecognizedMethod { .. }
                | Self::IdentityMismatch { .. }
        )
    }
}
