//! Token Acquisition Tests
//!
//! Tests the client-credentials flow against a mock token endpoint:
//! - Form body and space-delimited scopes
//! - Per-scope-set caching
//! - Error statuses and malformed responses

use dockhealth_client::{DockError, Scope, TokenClient};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{test_config, TOKEN};

fn token_client(server: &MockServer) -> TokenClient {
    TokenClient::new(reqwest::Client::new(), &test_config(&server.uri())).unwrap()
}

fn token_response(expires_in: Option<i64>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": TOKEN,
        "token_type": "Bearer",
        "expires_in": expires_in
    }))
}

#[tokio::test]
async fn test_form_body_carries_credentials_and_scopes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .and(body_string_contains(
            "scope=dockhealth%2Fuser.all.read+dockhealth%2Fpatient.all.read",
        ))
        .respond_with(token_response(Some(3600)))
        .expect(1)
        .mount(&server)
        .await;

    let token = token_client(&server)
        .get_access_token(&[Scope::UserAllRead, Scope::PatientAllRead])
        .await
        .unwrap();

    assert_eq!(token, TOKEN);
}

#[tokio::test]
async fn test_token_cached_per_scope_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response(Some(3600)))
        .expect(2)
        .mount(&server)
        .await;

    let client = token_client(&server);
    client
        .get_access_token(&[Scope::UserAllRead, Scope::UserAllWrite])
        .await
        .unwrap();
    // Same set, different order: served from cache
    client
        .get_access_token(&[Scope::UserAllWrite, Scope::UserAllRead])
        .await
        .unwrap();
    client
        .get_access_token(&[Scope::SystemOrgRead])
        .await
        .unwrap();

    assert_eq!(client.cached_tokens(), 2);

    client.invalidate_all();
    assert_eq!(client.cached_tokens(), 0);
}

#[tokio::test]
async fn test_token_without_expiry_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(token_response(None))
        .expect(2)
        .mount(&server)
        .await;

    let client = token_client(&server);
    client.get_access_token(&[Scope::UserAllRead]).await.unwrap();
    client.get_access_token(&[Scope::UserAllRead]).await.unwrap();

    assert_eq!(client.cached_tokens(), 0);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .get_access_token(&[Scope::UserAllRead])
        .await
        .unwrap_err();

    match err {
        DockError::UnexpectedStatus { actual, body, .. } => {
            assert_eq!(actual, 400);
            assert_eq!(body, "invalid_client");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_scopes_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(token_response(Some(3600)))
        .expect(0)
        .mount(&server)
        .await;

    let err = token_client(&server).get_access_token(&[]).await.unwrap_err();
    assert_eq!(err.to_string(), "Token error: Scopes are not defined!");
}

#[tokio::test]
async fn test_empty_access_token_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "" })))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .get_access_token(&[Scope::UserAllRead])
        .await
        .unwrap_err();
    assert!(matches!(err, DockError::Token(_)));
}
