use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use enclave_plugin::{Diagnostics, Provider, Resource, Value};
use enclave_provider::resources::policy::{PolicyResource, PolicyState};
use enclave_provider::{EnclaveProvider, ProviderConfig};

fn config(server: &MockServer, organisation: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        token: Value::Value("test-token".to_string()),
        organisation: organisation.map(str::to_string).into(),
        url: Value::Value(server.uri()),
    }
}

async fn mount_orgs(server: &MockServer, orgs: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/account/orgs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orgs": orgs })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn single_org_binds_without_selection() {
    let server = MockServer::start().await;
    mount_orgs(&server, json!([{ "orgId": "org-1", "orgName": "Only Org" }])).await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    assert!(provider.configure(config(&server, None), &mut diags).await.is_some());
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");

    // Operations land under the resolved organisation.
    Mock::given(method("GET"))
        .and(path("/org/org-1/policies/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "description": "existing",
            "isEnabled": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = PolicyResource::new(Arc::clone(&provider));
    let state = PolicyState {
        id: Value::Value(5),
        ..Default::default()
    };
    let mut diags = Diagnostics::new();
    assert!(resource.read(state, &mut diags).await.is_some());
    assert!(diags.is_empty());
}

#[tokio::test]
async fn multiple_orgs_without_selection_fail() {
    let server = MockServer::start().await;
    mount_orgs(
        &server,
        json!([
            { "orgId": "org-1", "orgName": "First" },
            { "orgId": "org-2", "orgName": "Second" },
        ]),
    )
    .await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    assert!(provider.configure(config(&server, None), &mut diags).await.is_none());
    let err = diags.errors().next().unwrap();
    assert_eq!(err.summary, "Multiple organisations found");
    assert!(err.detail.contains("organisation"));
    assert!(err.detail.contains("First"));
    assert!(err.detail.contains("Second"));
}

#[tokio::test]
async fn organisation_setting_selects_by_name_or_id() {
    let server = MockServer::start().await;
    mount_orgs(
        &server,
        json!([
            { "orgId": "org-1", "orgName": "First" },
            { "orgId": "org-2", "orgName": "Second" },
        ]),
    )
    .await;

    // By display name.
    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    assert!(provider
        .configure(config(&server, Some("Second")), &mut diags)
        .await
        .is_some());
    assert!(diags.is_empty());

    Mock::given(method("GET"))
        .and(path("/org/org-2/policies/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "description": "second org policy",
            "isEnabled": true,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let resource = PolicyResource::new(Arc::clone(&provider));
    let state = PolicyState {
        id: Value::Value(1),
        ..Default::default()
    };
    let mut diags = Diagnostics::new();
    assert!(resource.read(state, &mut diags).await.is_some());

    // By id.
    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    assert!(provider
        .configure(config(&server, Some("org-1")), &mut diags)
        .await
        .is_some());
    assert!(diags.is_empty());
}

#[tokio::test]
async fn unmatched_organisation_fails() {
    let server = MockServer::start().await;
    mount_orgs(&server, json!([{ "orgId": "org-1", "orgName": "First" }])).await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    assert!(provider
        .configure(config(&server, Some("missing")), &mut diags)
        .await
        .is_none());
    let err = diags.errors().next().unwrap();
    assert_eq!(err.summary, "Could not find organisation");
    assert!(err.detail.contains("'missing'"));
}

#[tokio::test]
async fn empty_or_null_token_is_rejected() {
    let server = MockServer::start().await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    let empty = ProviderConfig {
        token: Value::Value(String::new()),
        organisation: Value::Null,
        url: Value::Value(server.uri()),
    };
    assert!(provider.configure(empty, &mut diags).await.is_none());
    assert_eq!(diags.errors().next().unwrap().summary, "Unable to find token");

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    let null = ProviderConfig {
        token: Value::Null,
        organisation: Value::Null,
        url: Value::Value(server.uri()),
    };
    assert!(provider.configure(null, &mut diags).await.is_none());
    assert_eq!(diags.errors().next().unwrap().summary, "Unable to find token");
}

#[tokio::test]
async fn unknown_token_warns_and_leaves_provider_unconfigured() {
    let server = MockServer::start().await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    let cfg = ProviderConfig {
        token: Value::Unknown,
        organisation: Value::Null,
        url: Value::Value(server.uri()),
    };
    assert!(provider.configure(cfg, &mut diags).await.is_some());
    assert!(!diags.has_errors());
    assert_eq!(diags.warnings().next().unwrap().summary, "Unable to create client");

    // Resource operations now fail fast instead of calling out.
    let resource = PolicyResource::new(Arc::clone(&provider));
    let mut diags = Diagnostics::new();
    assert!(resource.create(PolicyState::default(), &mut diags).await.is_none());
    let err = diags.errors().next().unwrap();
    assert_eq!(err.summary, "Provider not configured");
    assert!(err.detail.contains("unknown value"));
}

#[tokio::test]
async fn unknown_organisation_defers_without_listing_organisations() {
    let server = MockServer::start().await;
    // Two orgs would normally demand a selection; an unknown selection must
    // defer configuration before the listing, not hard-fail the resolution.
    Mock::given(method("GET"))
        .and(path("/account/orgs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orgs": [
            { "orgId": "org-1", "orgName": "First" },
            { "orgId": "org-2", "orgName": "Second" },
        ]})))
        .expect(0)
        .mount(&server)
        .await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    let cfg = ProviderConfig {
        token: Value::Value("test-token".to_string()),
        organisation: Value::Unknown,
        url: Value::Value(server.uri()),
    };
    assert!(provider.configure(cfg, &mut diags).await.is_some());
    assert!(!diags.has_errors());
    let warning = diags.warnings().next().unwrap();
    assert_eq!(warning.summary, "Unable to create client");
    assert!(warning.detail.contains("organisation"));

    let resource = PolicyResource::new(Arc::clone(&provider));
    let mut diags = Diagnostics::new();
    assert!(resource.create(PolicyState::default(), &mut diags).await.is_none());
    assert_eq!(diags.errors().next().unwrap().summary, "Provider not configured");
}

#[tokio::test]
async fn unknown_url_defers_configuration() {
    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    let cfg = ProviderConfig {
        token: Value::Value("test-token".to_string()),
        organisation: Value::Null,
        url: Value::Unknown,
    };
    assert!(provider.configure(cfg, &mut diags).await.is_some());
    assert!(!diags.has_errors());
    assert!(diags.warnings().next().unwrap().detail.contains("url"));
}

#[tokio::test]
async fn failed_org_listing_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/orgs"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Token is invalid",
        })))
        .mount(&server)
        .await;

    let provider = EnclaveProvider::new();
    let mut diags = Diagnostics::new();
    assert!(provider.configure(config(&server, None), &mut diags).await.is_none());
    let err = diags.errors().next().unwrap();
    assert_eq!(err.summary, "Error getting organisations");
    assert!(err.detail.contains("Token is invalid"));
}
