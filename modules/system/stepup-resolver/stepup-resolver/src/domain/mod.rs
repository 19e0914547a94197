//! Domain layer for the step-up resolver.

pub mod aggregator;
pub mod error;
pub mod escalation;
pub mod local_client;
pub mod pattern_cache;
pub mod ranking;
pub mod registry;
pub mod resolvers;
pub mod service;
pub mod service_registry;
pub mod translator;
pub mod validation;


pub use error::DomainError;
pub use local_client::StepUpResolverLocalClient;
pub use ranking::{OrderedRankingStrategy, RankingStrategy};
pub use registry::MethodRegistry;
pub use service::Service;
pub use service_registry::StaticServiceRegistry;
pub use validation::ValidationSpecification;
