//! Callback Server Integration Tests
//!
//! Tests the webhook callback flow end to end:
//! - Verification challenge digests
//! - X-Dock-Signature-256 verification on event deliveries
//! - Status codes for missing, malformed and mismatched signatures
//! - A live server receiving events over TCP

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use dockhealth_client::config::CallbackConfig;
use dockhealth_client::handlers::CallbackState;
use dockhealth_client::{middleware, server, CallbackServer, SignatureState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::support::signature_header;

const SECRET: &str = "test-webhook-secret";

fn app_with(signer: SignatureState) -> (Router, Arc<CallbackState>) {
    let state = Arc::new(CallbackState::new(signer));
    (server::router(state.clone()), state)
}

fn app() -> (Router, Arc<CallbackState>) {
    app_with(SignatureState::new(SECRET))
}

fn event_request(uri: &str, signature: Option<String>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Dock-Signature-256", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_event() -> String {
    json!({
        "type": "UPDATE_ORGANIZATION",
        "eventIdentifier": "evt-1",
        "data": { "id": "org-1" }
    })
    .to_string()
}

// =============================================================================
// CHALLENGE TESTS
// =============================================================================

#[tokio::test]
async fn test_challenge_returns_hmac_digest() {
    let (app, state) = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/?message=verify-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["digest"],
        json!(middleware::sign(SECRET.as_bytes(), b"verify-me").unwrap())
    );
    assert_eq!(state.challenge_count(), 1);
}

#[tokio::test]
async fn test_challenge_on_any_path() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/hooks/dock?message=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_challenge_without_message_rejected() {
    let (app, state) = app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.challenge_count(), 0);
}

// =============================================================================
// EVENT DELIVERY TESTS
// =============================================================================

#[tokio::test]
async fn test_valid_event_acknowledged() {
    let (app, state) = app();
    let body = sample_event();
    let signature = signature_header(SECRET, Utc::now().timestamp(), &body);

    let response = app
        .oneshot(event_request("/", Some(signature), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({}));
    assert_eq!(state.event_count(), 1);
    assert_eq!(state.events()[0]["eventIdentifier"], json!("evt-1"));
}

#[tokio::test]
async fn test_missing_signature_header_is_server_error() {
    let (app, state) = app();
    let response = app
        .oneshot(event_request("/", None, &sample_event()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.event_count(), 0);
}

#[tokio::test]
async fn test_malformed_signature_header_rejected() {
    for header in ["garbage", "t1700000000,v=abc", "t=,v=abc"] {
        let (app, state) = app();
        let response = app
            .oneshot(event_request("/", Some(header.to_string()), &sample_event()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "header {}", header);
        assert_eq!(state.event_count(), 0);
    }
}

#[tokio::test]
async fn test_signature_mismatch_rejected() {
    let (app, state) = app();
    let body = sample_event();
    let signature = signature_header("some-other-secret", Utc::now().timestamp(), &body);

    let response = app
        .oneshot(event_request("/", Some(signature), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["reason"], json!("signature_verification_failed"));
    assert_eq!(state.event_count(), 0);
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let (app, _) = app();
    let signature = signature_header(SECRET, Utc::now().timestamp(), &sample_event());
    let tampered = json!({ "type": "DELETE_USER" }).to_string();

    let response = app
        .oneshot(event_request("/", Some(signature), &tampered))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signed_invalid_json_rejected() {
    let (app, state) = app();
    let body = "not json";
    let signature = signature_header(SECRET, Utc::now().timestamp(), body);

    let response = app
        .oneshot(event_request("/", Some(signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.event_count(), 0);
}

#[tokio::test]
async fn test_signed_empty_body_rejected() {
    let (app, _) = app();
    let signature = signature_header(SECRET, Utc::now().timestamp(), "");

    let response = app
        .oneshot(event_request("/", Some(signature), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_previous_secret_accepted_during_rotation() {
    let (app, state) = app_with(SignatureState::with_rotation(
        vec!["new-secret".to_string(), "old-secret".to_string()],
        None,
    ));
    let body = sample_event();
    let signature = signature_header("old-secret", Utc::now().timestamp(), &body);

    let response = app
        .oneshot(event_request("/callback", Some(signature), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.event_count(), 1);
}

#[tokio::test]
async fn test_timestamp_drift_enforced_when_configured() {
    let (app, state) = app_with(SignatureState::with_rotation(
        vec![SECRET.to_string()],
        Some(300),
    ));
    let body = sample_event();
    let stale = signature_header(SECRET, Utc::now().timestamp() - 3600, &body);

    let response = app
        .clone()
        .oneshot(event_request("/", Some(stale), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Millisecond timestamps are accepted
    let fresh = signature_header(SECRET, Utc::now().timestamp_millis(), &body);
    let response = app
        .oneshot(event_request("/", Some(fresh), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.event_count(), 1);
}

#[tokio::test]
async fn test_extreme_timestamps_rejected_without_panic() {
    let (app, state) = app_with(SignatureState::with_rotation(
        vec![SECRET.to_string()],
        Some(300),
    ));
    let body = sample_event();

    for timestamp in [i64::MIN, i64::MIN + 1, i64::MAX] {
        let header = format!("t={},v=abc", timestamp);
        let response = app
            .clone()
            .oneshot(event_request("/", Some(header), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "t={}", timestamp);
    }
    assert_eq!(state.event_count(), 0);
}

#[tokio::test]
async fn test_stale_timestamp_accepted_by_default() {
    let (app, _) = app();
    let body = sample_event();
    let signature = signature_header(SECRET, 1_600_000_000, &body);

    let response = app
        .oneshot(event_request("/", Some(signature), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// LIVE SERVER TESTS
// =============================================================================

fn local_config() -> CallbackConfig {
    CallbackConfig {
        host: "127.0.0.1".to_string(),
        local_port: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_live_server_receives_events() {
    let mut handle = CallbackServer::start(&local_config(), vec![SECRET.to_string()])
        .await
        .unwrap();
    let base = format!("http://{}", handle.local_addr());
    let http = reqwest::Client::new();

    let challenge: Value = http
        .get(format!("{}/?message=hello", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        challenge["digest"],
        json!(middleware::sign(SECRET.as_bytes(), b"hello").unwrap())
    );

    let body = sample_event();
    let response = http
        .post(format!("{}/events", base))
        .header("x-dock-signature-256", signature_header(SECRET, Utc::now().timestamp(), &body))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let events = handle
        .wait_for_events(1, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(handle.challenge_count(), 1);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_wait_for_events_wakes_on_delivery() {
    let mut handle = CallbackServer::start(&local_config(), vec![SECRET.to_string()])
        .await
        .unwrap();
    let url = format!("http://{}/", handle.local_addr());

    let sender = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let body = sample_event();
        reqwest::Client::new()
            .post(url)
            .header("x-dock-signature-256", signature_header(SECRET, Utc::now().timestamp(), &body))
            .body(body)
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    });

    let events = handle
        .wait_for_events(1, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(sender.await.unwrap(), 200);

    handle.stop().await.unwrap();
}
