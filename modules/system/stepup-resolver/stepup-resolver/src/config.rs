//! Configuration for the step-up resolver.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use stepup_resolver_sdk::{AUTHN_METHOD_ATTRIBUTE, AuthenticationMethod, RegisteredService};

use crate::domain::DomainError;

/// Prefix of environment variables that override file settings.
/// Nested keys are separated by a double underscore.
pub const ENV_PREFIX: &str = "STEPUP__";

/// Configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepUpResolverConfig {
    /// Inline method registry entries.
    pub methods: Vec<AuthenticationMethod>,

    /// JSON file with additional registry entries.
    pub methods_file: Option<PathBuf>,

    /// Principal attribute read by the principal-attribute resolver.
    pub principal_attribute: String,

    /// Method required when a registered service declares none.
    pub default_method: Option<String>,

    /// Maps raw request and attribute values to method names.
    pub translator: TranslatorConfig,

    /// Resolvers consulted for every attempt, in order.
    pub resolvers: Vec<ResolverKind>,

    /// Target applications served by the built-in static registry.
    pub services: Vec<RegisteredService>,
}

impl Default for StepUpResolverConfig {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            methods_file: None,
            principal_attribute: AUTHN_METHOD_ATTRIBUTE.to_owned(),
            default_method: None,
            translator: TranslatorConfig::default(),
            resolvers: vec![
                ResolverKind::RequestParameter,
                ResolverKind::ServiceDefinition,
                ResolverKind::RoleRule,
            ],
            services: Vec::new(),
        }
    }
}

impl StepUpResolverConfig {
    /// Loads configuration from defaults, a YAML file and `STEPUP__`
    /// environment variables, later layers winning. A missing file is
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] if a layer cannot be parsed or holds
    /// unknown keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        tracing::debug!(
            path = %path.as_ref().display(),
            methods = config.methods.len(),
            resolvers = config.resolvers.len(),
            "Loaded stepup_resolver configuration"
        );
        Ok(config)
    }
}

/// Resolver kinds that can be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    /// Explicit method parameter on the login request.
    RequestParameter,
    /// Static method declared by the target application.
    ServiceDefinition,
    /// Attribute-conditioned role rule, falling back to the principal
    /// attribute.
    RoleRule,
    /// Principal attribute only.
    PrincipalAttribute,
}

/// Method translator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum TranslatorConfig {
    /// Values are used as method names unchanged.
    #[default]
    Passthrough,

    /// Values are looked up in sets.
    Static {
        mappings: Vec<StaticMapping>,
        #[serde(default = "default_ignore_if_no_match")]
        ignore_if_no_match: bool,
    },

    /// Values are matched against patterns.
    Regex {
        mappings: Vec<RegexMapping>,
        #[serde(default = "default_ignore_if_no_match")]
        ignore_if_no_match: bool,
        #[serde(default)]
        default_method: Option<String>,
    },
}

fn default_ignore_if_no_match() -> bool {
    true
}

/// A value set mapped to one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticMapping {
    pub values: Vec<String>,
    pub method: String,
}

/// A pattern mapped to one method. The pattern must match the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexMapping {
    pub pattern: String,
    pub method: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_enable_request_service_and_role_resolvers() {
        let config = StepUpResolverConfig::default();
        assert_eq!(config.principal_attribute, "authn_method");
        assert_eq!(
            config.resolvers,
            vec![
                ResolverKind::RequestParameter,
                ResolverKind::ServiceDefinition,
                ResolverKind::RoleRule,
            ]
        );
        assert_eq!(config.translator, TranslatorConfig::Passthrough);
    }

    #[test]
    fn load_reads_yaml_file() {
        let file = write_yaml(
            r#"
methods:
  - name: duo
    rank: 1
  - name: otp
    rank: 2
default_method: otp
translator:
  kind: regex
  mappings:
    - pattern: "^strong.*"
      method: duo
services:
  - id: https://app.example.org
    authn_method: duo
"#,
        );

        temp_env::with_var_unset("STEPUP__DEFAULT_METHOD", || {
            let config = StepUpResolverConfig::load(file.path()).unwrap();
            assert_eq!(config.methods.len(), 2);
            assert_eq!(config.default_method.as_deref(), Some("otp"));
            assert_eq!(config.services[0].authn_method.as_deref(), Some("duo"));
            match config.translator {
                TranslatorConfig::Regex {
                    mappings,
                    ignore_if_no_match,
                    default_method,
                } => {
                    assert_eq!(mappings.len(), 1);
                    assert!(ignore_if_no_match);
                    assert!(default_method.is_none());
                }
                other => panic!("unexpected translator: {other:?}"),
            }
        });
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_yaml("default_method: otp\n");
        temp_env::with_var("STEPUP__DEFAULT_METHOD", Some("duo"), || {
            let config = StepUpResolverConfig::load(file.path()).unwrap();
            assert_eq!(config.default_method.as_deref(), Some("duo"));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StepUpResolverConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert!(config.methods.is_empty());
        assert_eq!(config.resolvers.len(), 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_yaml("unknown_setting: true\n");
        let err = StepUpResolverConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));
    }
}
