//! Per-attempt aggregation of method requests.

use crate::error::StepUpResolverError;
use crate::models::{Authentication, MethodRequest, MethodSource};

/// All method requests gathered for one login attempt.
///
/// Every request targets [`Transaction::target_service_id`] and no two
/// requests share a [`MethodSource`]. Both rules are enforced on insertion
/// and a rejected request leaves the transaction untouched.
#[derive(Debug, Clone)]
pub struct Transaction {
    target_service_id: String,
    primary_authentication: Option<Authentication>,
    requests: Vec<MethodRequest>,
}

impl Transaction {
    /// Empty transaction for `target_service_id`.
    #[must_use]
    pub fn new(target_service_id: impl Into<String>) -> Self {
        Self {
            target_service_id: target_service_id.into(),
            primary_authentication: None,
            requests: Vec::new(),
        }
    }

    /// Transaction seeded with its first request. The target service is
    /// taken from the request.
    #[must_use]
    pub fn from_request(request: MethodRequest) -> Self {
        Self {
            target_service_id: request.target_service_id().to_owned(),
            primary_authentication: None,
            requests: vec![request],
        }
    }

    #[must_use]
    pub fn target_service_id(&self) -> &str {
        &self.target_service_id
    }

    #[must_use]
    pub fn primary_authentication(&self) -> Option<&Authentication> {
        self.primary_authentication.as_ref()
    }

    pub fn set_primary_authentication(&mut self, authentication: Authentication) {
        self.primary_authentication = Some(authentication);
    }

    #[must_use]
    pub fn requests(&self) -> &[MethodRequest] {
        &self.requests
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn contains_source(&self, source: MethodSource) -> bool {
        self.requests.iter().any(|r| r.source() == source)
    }

    /// Adds a request to the transaction.
    ///
    /// # Errors
    ///
    /// - [`StepUpResolverError::TargetServiceMismatch`] if the request targets
    ///   another service
    /// - [`StepUpResolverError::DuplicateSource`] if a request from the same
    ///   source is already present
    pub fn add_request(
        &mut self,
        request: MethodRequest,
    ) -> Result<&mut Self, StepUpResolverError> {
        if request.target_service_id() != self.target_service_id {
            return Err(StepUpResolverError::TargetServiceMismatch {
                expected: self.target_service_id.clone(),
                actual: request.target_service_id().to_owned(),
            });
        }
        if self.contains_source(request.source()) {
            return Err(StepUpResolverError::DuplicateSource {
                method_source: request.source(),
            });
        }
        self.requests.push(request);
        Ok(self)
    }

    /// Adds every request in order, stopping at the first rejection.
    ///
    /// Requests accepted before the rejected one stay in the transaction.
    ///
    /// # Errors
    ///
    /// Same as [`Transaction::add_request`].
    pub fn add_requests(
        &mut self,
        requests: impl IntoIterator<Item = MethodRequest>,
    ) -> Result<&mut Self, StepUpResolverError> {
        for request in requests {
            self.add_request(request)?;
        }
        Ok(self)
    }
}
