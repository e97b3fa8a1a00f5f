//! API Client Tests
//!
//! Tests request construction and status handling against a mock API:
//! - Identity headers on every call
//! - Exact status matching (200 vs 204)
//! - Developer event query parameters

use dockhealth_client::{DockClient, DockError, EventFilter, Identity, Scope};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{mount_token, test_config, API_KEY, ORGANIZATION_ID, TOKEN, USER_ID};

async fn setup() -> (MockServer, DockClient) {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let client = DockClient::new(&test_config(&server.uri())).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_base_url_appends_api_prefix() {
    let (server, client) = setup().await;
    assert_eq!(client.base_url(), format!("{}/api/v1", server.uri()));
}

#[tokio::test]
async fn test_user_and_org_headers_sent() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/user/{}", USER_ID)))
        .and(header("authorization", TOKEN))
        .and(header("x-api-key", API_KEY))
        .and(header("x-user-id", USER_ID))
        .and(header("x-organization-id", ORGANIZATION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": USER_ID,
            "email": "owner@example.test"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client
        .session(
            &[Scope::UserAllRead],
            Identity::user_and_org(USER_ID, ORGANIZATION_ID),
        )
        .await
        .unwrap();
    let user = client.get_user(&session, USER_ID).await.unwrap();

    assert_eq!(user.id, USER_ID);
    assert_eq!(user.email.as_deref(), Some("owner@example.test"));
}

#[tokio::test]
async fn test_developer_identity_sends_no_user_headers() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/organization"))
        .and(header("x-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "org-a", "domain": "other.test" },
            { "id": "org-b", "domain": "example.test" }
        ])))
        .mount(&server)
        .await;

    let session = client
        .session(&[Scope::SystemOrgRead], Identity::Developer)
        .await
        .unwrap();
    let org = client
        .find_default_organization(&session, "example.test")
        .await
        .unwrap();
    assert_eq!(org.id, "org-b");

    let requests = server.received_requests().await.unwrap();
    let api_call = requests
        .iter()
        .find(|r| r.url.path() == "/api/v1/developer/organization")
        .unwrap();
    assert!(api_call.headers.get("x-user-id").is_none());
    assert!(api_call.headers.get("x-organization-id").is_none());

    let missing = client
        .find_default_organization(&session, "absent.test")
        .await
        .unwrap_err();
    assert!(matches!(missing, DockError::Assertion(_)));
}

#[tokio::test]
async fn test_unexpected_status_carries_details() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/patient/p-404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such patient"))
        .mount(&server)
        .await;

    let session = client
        .session(&[Scope::PatientAllRead], Identity::user_and_org(USER_ID, ORGANIZATION_ID))
        .await
        .unwrap();
    let err = client.get_patient(&session, "p-404").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    match err {
        DockError::UnexpectedStatus {
            method,
            expected,
            body,
            ..
        } => {
            assert_eq!(method, "GET");
            assert_eq!(expected, 200);
            assert_eq!(body, "no such patient");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_task_delete_requires_no_content() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/task/t-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/task/t-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "t-2" })))
        .mount(&server)
        .await;

    let session = client
        .session(&[Scope::UserAllWrite], Identity::user_and_org(USER_ID, ORGANIZATION_ID))
        .await
        .unwrap();

    client.delete_task(&session, "t-1").await.unwrap();

    let err = client.delete_task(&session, "t-2").await.unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_developer_event_query() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/event"))
        .and(query_param("organization", "org-1"))
        .and(query_param("event", "evt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "eventIdentifier": "evt-1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let session = client
        .session(&[Scope::SystemDeveloperRead], Identity::Developer)
        .await
        .unwrap();
    let events = client
        .developer_events(&session, "org-1", &EventFilter::Event("evt-1".to_string()))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_identifier.as_deref(), Some("evt-1"));
}

#[tokio::test]
async fn test_missing_identity_value_fails_before_sending() {
    let (server, client) = setup().await;
    let session = client
        .session(&[Scope::UserAllRead], Identity::user(""))
        .await
        .unwrap();

    let err = client.get_user(&session, "anyone").await.unwrap_err();
    assert_eq!(err.to_string(), "User id is undefined!");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/oauth2/token"));
}
