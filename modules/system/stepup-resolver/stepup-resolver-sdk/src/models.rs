//! Domain models for the step-up resolver module.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication attribute that records the methods an authentication
/// satisfied. Also the default principal attribute and request parameter
/// that carry a requested method.
pub const AUTHN_METHOD_ATTRIBUTE: &str = "authn_method";

/// Attribute map shared by principals and authentications.
pub type Attributes = BTreeMap<String, Value>;

/// A recognized authentication method and its strength.
///
/// Lower `rank` means stronger. Identity is the method `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationMethod {
    name: String,
    rank: i32,
}

impl AuthenticationMethod {
    #[must_use]
    pub fn new(name: impl Into<String>, rank: i32) -> Self {
        Self {
            name: name.into(),
            rank,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Strictly stronger. Equal ranks are not stronger.
    #[must_use]
    pub fn is_stronger_than(&self, other: &Self) -> bool {
        self.rank < other.rank
    }

    #[must_use]
    pub fn is_at_least_as_strong_as(&self, other: &Self) -> bool {
        self.rank <= other.rank
    }
}

impl PartialEq for AuthenticationMethod {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AuthenticationMethod {}

impl Hash for AuthenticationMethod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Where a method request came from.
///
/// The declaration order is the tie-break order used when two requests
/// share the lowest rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodSource {
    /// Explicit method parameter on the inbound request.
    RequestParam,
    /// Attribute of the authenticated principal.
    PrincipalAttribute,
    /// Static declaration on the registered target application.
    RegisteredServiceDefinition,
}

impl fmt::Display for MethodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RequestParam => "REQUEST_PARAM",
            Self::PrincipalAttribute => "PRINCIPAL_ATTRIBUTE",
            Self::RegisteredServiceDefinition => "REGISTERED_SERVICE_DEFINITION",
        };
        f.write_str(s)
    }
}

/// A single resolver's demand that `method` be satisfied for a target service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRequest {
    method: String,
    target_service_id: String,
    source: MethodSource,
}

impl MethodRequest {
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        target_service_id: impl Into<String>,
        source: MethodSource,
    ) -> Self {
        Self {
            method: method.into(),
            target_service_id: target_service_id.into(),
            source,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn target_service_id(&self) -> &str {
        &self.target_service_id
    }

    #[must_use]
    pub fn source(&self) -> MethodSource {
        self.source
    }
}

impl fmt::Display for MethodRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodRequest{{ service={}, authn_method={}, source={} }}",
            self.target_service_id, self.method, self.source
        )
    }
}

/// An authenticated subject. Two principals are the same identity when
/// their ids are equal, whatever their attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    id: String,
    #[serde(default)]
    attributes: Attributes,
}

impl Principal {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for Principal {}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// The result of one completed authentication step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authentication {
    principal: Principal,
    #[serde(default)]
    attributes: Attributes,
    authenticated_at: DateTime<Utc>,
}

impl Authentication {
    /// Authentication performed now, with no attributes.
    #[must_use]
    pub fn new(principal: Principal) -> Self {
        Self::with_attributes(principal, Attributes::new())
    }

    #[must_use]
    pub fn with_attributes(principal: Principal, attributes: Attributes) -> Self {
        Self {
            principal,
            attributes,
            authenticated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn at(
        principal: Principal,
        attributes: Attributes,
        authenticated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            principal,
            attributes,
            authenticated_at,
        }
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    /// Set or replace an authentication attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Methods this authentication satisfied, read from
    /// [`AUTHN_METHOD_ATTRIBUTE`].
    #[must_use]
    pub fn satisfied_methods(&self) -> BTreeSet<String> {
        satisfied_methods(&self.attributes)
    }
}

/// Methods recorded under [`AUTHN_METHOD_ATTRIBUTE`] in an attribute map.
///
/// A string is one method, an array contributes each string element, and
/// an object contributes each string value. Anything else counts as none.
#[must_use]
pub fn satisfied_methods(attributes: &Attributes) -> BTreeSet<String> {
    attributes
        .get(AUTHN_METHOD_ATTRIBUTE)
        .map_or_else(BTreeSet::new, |value| {
            value_to_collection(value)
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
}

/// Flattens a value into its elements: arrays yield their items, objects
/// yield their values, nulls yield nothing and scalars yield themselves.
#[must_use]
pub fn value_to_collection(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Scalar string or list-of-strings view of an attribute value, as read by
/// attribute-driven resolvers. Non-string list elements are skipped.
#[must_use]
pub fn string_values(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Opaque credential presented for one step. The secret is redacted from
/// `Debug` output.
#[derive(Debug, Clone)]
pub struct Credential {
    identifier: String,
    secret: Option<SecretString>,
}

impl Credential {
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: None,
        }
    }

    #[must_use]
    pub fn with_secret(identifier: impl Into<String>, secret: impl Into<SecretString>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: Some(secret.into()),
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }
}

/// Attribute-conditioned role rule declared by a target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MfaRoleRule {
    /// Principal attribute to read.
    pub attribute_name: Option<String>,
    /// Regular expression the attribute value must fully match.
    pub attribute_pattern: Option<String>,
}

/// Already-parsed definition of a target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisteredService {
    /// Service identifier, matched against `LoginRequest::service_id`.
    pub id: String,
    /// Method the application requires.
    #[serde(default)]
    pub authn_method: Option<String>,
    /// Role rule; when present the static declaration defers to it.
    #[serde(default)]
    pub mfa_role: Option<MfaRoleRule>,
}

impl RegisteredService {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            authn_method: None,
            mfa_role: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.authn_method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_role(
        mut self,
        attribute_name: impl Into<String>,
        attribute_pattern: impl Into<String>,
    ) -> Self {
        self.mfa_role = Some(MfaRoleRule {
            attribute_name: Some(attribute_name.into()),
            attribute_pattern: Some(attribute_pattern.into()),
        });
        self
    }
}

/// Values already extracted from the inbound login request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Target application identifier.
    pub service_id: String,
    /// Explicit method parameter, if any.
    #[serde(default)]
    pub authn_method: Option<String>,
    /// Existing single-sign-on session (ticket) identifier, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Caller forced re-authentication.
    #[serde(default)]
    pub renew: bool,
}

impl LoginRequest {
    #[must_use]
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.authn_method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_renew(mut self) -> Self {
        self.renew = true;
        self
    }

    /// Session id, treating a blank value as absent.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Flow event that tells the engine to proceed without step-up.
pub const EVENT_ID_REQUIRE_TGT: &str = "requireTgt";

/// Prefix of the flow event that enters a method-specific sub-flow.
pub const MFA_EVENT_ID_PREFIX: &str = "mfa_";

/// Outcome of the escalation decision for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationDecision {
    /// Proceed with the normal login path.
    ContinueNormally,
    /// Branch into the sub-flow for this request's method.
    RequireMethod(MethodRequest),
}

impl EscalationDecision {
    #[must_use]
    pub fn required_method(&self) -> Option<&str> {
        match self {
            Self::ContinueNormally => None,
            Self::RequireMethod(request) => Some(request.method()),
        }
    }

    /// Event id the flow engine transitions on.
    #[must_use]
    pub fn event_id(&self) -> String {
        match self {
            Self::ContinueNormally => EVENT_ID_REQUIRE_TGT.to_owned(),
            Self::RequireMethod(request) => format!("{MFA_EVENT_ID_PREFIX}{}", request.method()),
        }
    }
}

/// Outcome of chaining one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Everything required so far is satisfied.
    Completed,
    /// The selected method still has to be completed.
    RequireMethod(MethodRequest),
}
