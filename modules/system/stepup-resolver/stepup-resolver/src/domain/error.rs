//! Domain errors for the step-up resolver.

use stepup_resolver_sdk::StepUpResolverError;

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("authentication method '{method}' is not registered")]
    UnregisteredMethod { method: String },

    #[error("requested authentication method '{method}' is not available")]
    UnacceptableMethod { method: String },

    #[error("authentication method '{method}' is not recognized for service '{service_id}'")]
    UnrecognizedMethod { method: String, service_id: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("composite authentication failed validation: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Rejected(#[from] StepUpResolverError),
}

impl From<figment::Error> for DomainError {
    fn from(e: figment::Error) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}

impl From<DomainError> for StepUpResolverError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnregisteredMethod { method } => Self::UnregisteredMethod { method },
            DomainError::UnacceptableMethod { method } => Self::UnacceptableMethod { method },
            DomainError::UnrecognizedMethod { method, service_id } => Self::UnrecognizedMethod {
                method,
                service_id: Some(service_id),
            },
            DomainError::InvalidPattern { pattern, reason } => {
                Self::InvalidConfiguration(format!("invalid pattern '{pattern}': {reason}"))
            }
            DomainError::InvalidConfig(reason) => Self::InvalidConfiguration(reason),
            DomainError::ValidationFailed(reason) => Self::Internal(reason),
            DomainError::Rejected(e) => e,
        }
    }
}
