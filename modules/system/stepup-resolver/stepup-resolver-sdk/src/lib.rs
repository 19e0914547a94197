//! Step-up Resolver SDK
//!
//! This crate provides the public API for the `stepup_resolver` module:
//!
//! - [`StepUpResolverClient`] - Public API trait for the flow engine
//! - [`SessionStore`], [`ServiceRegistry`] - Host collaborator traits
//! - [`Transaction`] - Method requests gathered for one login attempt
//! - [`CredentialChain`], [`CompositeAuthentication`] - Multi-step chaining
//! - [`StepUpResolverError`] - Error types
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod attempt;
pub mod chain;
pub mod error;
pub mod models;
pub mod plugin_api;
pub mod transaction;

// Re-export main types at crate root
pub use api::StepUpResolverClient;
pub use attempt::{AttemptState, LoginAttempt};
pub use chain::{CompositeAuthentication, CredentialChain};
pub use error::StepUpResolverError;
pub use models::{
    AUTHN_METHOD_ATTRIBUTE, Attributes, Authentication, AuthenticationMethod, Credential,
    EscalationDecision, LoginRequest, MethodRequest, MethodSource, MfaRoleRule, Principal,
    RegisteredService, StepOutcome,
};
pub use plugin_api::{ServiceRegistry, SessionStore};
pub use transaction::Transaction;
