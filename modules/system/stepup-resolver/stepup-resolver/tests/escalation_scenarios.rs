#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use stepup_resolver::config::{RegexMapping, ResolverKind, StepUpResolverConfig, TranslatorConfig};
use stepup_resolver::domain::{Service, StepUpResolverLocalClient};
use stepup_resolver_sdk::{
    AUTHN_METHOD_ATTRIBUTE, Attributes, Authentication, AuthenticationMethod, EscalationDecision,
    LoginRequest, MethodSource, Principal, RegisteredService, SessionStore, StepOutcome,
    StepUpResolverClient, StepUpResolverError,
};

const APP: &str = "https://app.example.org";

#[derive(Default)]
struct Sessions(HashMap<String, Authentication>);

impl SessionStore for Sessions {
    fn authentication(&self, session_id: &str) -> Option<Authentication> {
        self.0.get(session_id).cloned()
    }
}

fn base_config() -> StepUpResolverConfig {
    StepUpResolverConfig {
        methods: vec![
            AuthenticationMethod::new("duo", 1),
            AuthenticationMethod::new("otp", 2),
        ],
        ..StepUpResolverConfig::default()
    }
}

fn client(
    config: &StepUpResolverConfig,
    sessions: Sessions,
) -> impl StepUpResolverClient + use<> {
    let svc = Service::from_config(config, Arc::new(sessions)).unwrap();
    StepUpResolverLocalClient::new(Arc::new(svc))
}

fn session_satisfied_with(method: &str) -> Sessions {
    let mut attributes = Attributes::new();
    attributes.insert(AUTHN_METHOD_ATTRIBUTE.to_owned(), json!(method));
    let auth = Authentication::with_attributes(Principal::new("alice"), attributes);
    Sessions(HashMap::from([("TGT-1".to_owned(), auth)]))
}

#[test]
fn otp_requested_with_duo_session_continues() {
    let c = client(&base_config(), session_satisfied_with("duo"));
    let request = LoginRequest::new(APP).with_method("otp").with_session("TGT-1");

    let mut attempt = c.begin(&request).unwrap();
    let decision = c.evaluate(&mut attempt, &request).unwrap();
    assert_eq!(decision, EscalationDecision::ContinueNormally);
}

#[test]
fn duo_requested_with_otp_session_requires_duo() {
    let c = client(&base_config(), session_satisfied_with("otp"));
    let request = LoginRequest::new(APP).with_method("duo").with_session("TGT-1");

    let mut attempt = c.begin(&request).unwrap();
    let decision = c.evaluate(&mut attempt, &request).unwrap();
    match decision {
        EscalationDecision::RequireMethod(required) => {
            assert_eq!(required.method(), "duo");
            assert_eq!(required.source(), MethodSource::RequestParam);
            assert_eq!(required.target_service_id(), APP);
        }
        EscalationDecision::ContinueNormally => panic!("expected step-up"),
    }
}

#[test]
fn no_prior_session_defers_enforcement() {
    let c = client(&base_config(), Sessions::default());
    let request = LoginRequest::new(APP).with_method("duo");

    let mut attempt = c.begin(&request).unwrap();
    assert_eq!(
        c.evaluate(&mut attempt, &request).unwrap(),
        EscalationDecision::ContinueNormally
    );
}

#[test]
fn forced_renew_bypasses_escalation() {
    let c = client(&base_config(), session_satisfied_with("otp"));
    let request = LoginRequest::new(APP)
        .with_method("duo")
        .with_session("TGT-1")
        .with_renew();

    let mut attempt = c.begin(&request).unwrap();
    assert_eq!(
        c.evaluate(&mut attempt, &request).unwrap(),
        EscalationDecision::ContinueNormally
    );
}

#[test]
fn full_step_up_flow_produces_composite_authentication() {
    let mut config = base_config();
    config.services = vec![RegisteredService::new(APP).with_method("duo")];
    let c = client(&config, Sessions::default());
    let request = LoginRequest::new(APP);

    let mut attempt = c.begin(&request).unwrap();
    assert_eq!(
        c.evaluate(&mut attempt, &request).unwrap(),
        EscalationDecision::ContinueNormally
    );

    let mut principal_attributes = Attributes::new();
    principal_attributes.insert("mail".to_owned(), json!("alice@example.org"));
    let primary = Authentication::new(Principal::with_attributes("alice", principal_attributes));
    let outcome = c
        .complete_primary(&mut attempt, &request, primary, None)
        .unwrap();
    let StepOutcome::RequireMethod(required) = outcome else {
        panic!("expected duo to be required");
    };
    assert_eq!(required.method(), "duo");
    assert_eq!(
        required.source(),
        MethodSource::RegisteredServiceDefinition
    );

    let outcome = c
        .complete_method(&mut attempt, Authentication::new(Principal::new("alice")), None)
        .unwrap();
    assert_eq!(outcome, StepOutcome::Completed);

    let composite = c.finish(&attempt).unwrap();
    assert_eq!(composite.principal().id(), "alice");
    assert_eq!(
        composite.principal().attribute("mail"),
        Some(&json!("alice@example.org"))
    );
    assert!(composite.satisfied_methods().contains("duo"));
}

#[test]
fn role_rule_applies_to_matching_members() {
    let mut config = base_config();
    config.services = vec![
        RegisteredService::new(APP)
            .with_method("duo")
            .with_role("memberOf", "faculty|staff"),
    ];
    let c = client(&config, Sessions::default());
    let request = LoginRequest::new(APP);

    let mut attributes = Attributes::new();
    attributes.insert("memberOf".to_owned(), json!(["students", "staff"]));
    let primary = Authentication::new(Principal::with_attributes("alice", attributes));

    let mut attempt = c.begin(&request).unwrap();
    assert!(attempt.transaction().is_none());
    let outcome = c
        .complete_primary(&mut attempt, &request, primary, None)
        .unwrap();
    let StepOutcome::RequireMethod(required) = outcome else {
        panic!("expected the role rule to require duo");
    };
    assert_eq!(required.method(), "duo");
    assert_eq!(required.source(), MethodSource::PrincipalAttribute);
}

#[test]
fn regex_translator_maps_request_values() {
    let mut config = base_config();
    config.translator = TranslatorConfig::Regex {
        mappings: vec![RegexMapping {
            pattern: "strong.*".to_owned(),
            method: "duo".to_owned(),
        }],
        ignore_if_no_match: false,
        default_method: None,
    };
    config.resolvers = vec![ResolverKind::RequestParameter];
    let c = client(&config, session_satisfied_with("otp"));

    let request = LoginRequest::new(APP)
        .with_method("strong_two_factor")
        .with_session("TGT-1");
    let mut attempt = c.begin(&request).unwrap();
    assert_eq!(
        c.evaluate(&mut attempt, &request)
            .unwrap()
            .required_method(),
        Some("duo")
    );

    let err = c
        .begin(&LoginRequest::new(APP).with_method("weak"))
        .unwrap_err();
    assert_eq!(
        err,
        StepUpResolverError::UnrecognizedMethod {
            method: "weak".to_owned(),
            service_id: Some(APP.to_owned()),
        }
    );
    assert!(err.is_recoverable());
}

#[test]
fn unregistered_request_is_a_configuration_error() {
    let c = client(&base_config(), Sessions::default());
    let err = c
        .begin(&LoginRequest::new(APP).with_method("push"))
        .unwrap_err();
    assert_eq!(
        err,
        StepUpResolverError::UnregisteredMethod {
            method: "push".to_owned()
        }
    );
    assert!(!err.is_recoverable());
}

#[test]
fn second_principal_in_flow_is_rejected() {
    let c = client(&base_config(), session_satisfied_with("otp"));
    let request = LoginRequest::new(APP).with_method("duo").with_session("TGT-1");
    let mut attempt = c.begin(&request).unwrap();
    c.evaluate(&mut attempt, &request).unwrap();

    let err = c
        .complete_method(&mut attempt, Authentication::new(Principal::new("bob")), None)
        .unwrap_err();
    assert!(matches!(err, StepUpResolverError::IdentityMismatch { .. }));

    let composite = c.finish(&attempt);
    assert!(matches!(
        composite,
        Err(StepUpResolverError::UnrecognizedMethod { .. })
    ));
}

#[test]
fn methods_file_from_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let methods = dir.path().join("methods.json");
    std::fs::write(
        &methods,
        r#"[{"rank":1,"name":"duo_two_factor"},{"rank":2,"name":"strong_two_factor"}]"#,
    )
    .unwrap();

    let config_path = dir.path().join("stepup.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "methods_file: {}", methods.display()).unwrap();
    writeln!(file, "services:").unwrap();
    writeln!(file, "  - id: {APP}").unwrap();
    writeln!(file, "    authn_method: strong_two_factor").unwrap();
    drop(file);

    let config = StepUpResolverConfig::load(&config_path).unwrap();
    let c = client(&config, session_satisfied_with("duo_two_factor"));
    let request = LoginRequest::new(APP).with_session("TGT-1");
    let mut attempt = c.begin(&request).unwrap();
    assert_eq!(
        c.evaluate(&mut attempt, &request).unwrap(),
        EscalationDecision::ContinueNormally
    );
}
