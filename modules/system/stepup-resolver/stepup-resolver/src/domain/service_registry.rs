//! Registry of target applications built from configuration.

use std::collections::HashMap;

use stepup_resolver_sdk::{RegisteredService, ServiceRegistry};

#[derive(Debug, Clone, Default)]
pub struct StaticServiceRegistry {
    services: HashMap<String, RegisteredService>,
}

impl StaticServiceRegistry {
    /// Later definitions of the same id replace earlier ones.
    #[must_use]
    pub fn new(services: impl IntoIterator<Item = RegisteredService>) -> Self {
        Self {
            services: services.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceRegistry for StaticServiceRegistry {
    fn find(&self, service_id: &str) -> Option<RegisteredService> {
        self.services.get(service_id).cloned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn finds_by_id() {
        let registry = StaticServiceRegistry::new([
            RegisteredService::new("https://a.example.org").with_method("otp"),
            RegisteredService::new("https://b.example.org"),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry
                .find("https://a.example.org")
                .and_then(|s| s.authn_method),
            Some("otp".to_owned())
        );
        assert!(registry.find("https://c.example.org").is_none());
    }

    #[test]
    fn later_definition_wins() {
        let registry = StaticServiceRegistry::new([
            RegisteredService::new("svc").with_method("otp"),
            RegisteredService::new("svc").with_method("duo"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find("svc").and_then(|s| s.authn_method).as_deref(),
            Some("duo")
        );
    }
}
