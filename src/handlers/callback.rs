//! Webhook callback handlers
//!
//! Dock Health talks to a webhook URL in two ways:
//! - `GET ?message=...` challenge while verifying a newly created or updated webhook
//! - `POST` event delivery, signed with the webhook secret

use axum::{
    body::Bytes,
    extract::{Query, State},
    Extension, Json,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{DockError, DockResult};
use crate::middleware::{SignatureState, VerifiedSignature};

/// State shared by the callback handlers and the server handle
pub struct CallbackState {
    /// Signs challenges and verifies deliveries
    pub signer: Arc<SignatureState>,
    /// Event payloads in arrival order
    events: Mutex<Vec<Value>>,
    /// Number of challenges answered
    challenges: AtomicUsize,
    /// Woken on every recorded event
    notify: Notify,
}

impl CallbackState {
    pub fn new(signer: SignatureState) -> Self {
        Self {
            signer: Arc::new(signer),
            events: Mutex::new(Vec::new()),
            challenges: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<Value> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn challenge_count(&self) -> usize {
        self.challenges.load(Ordering::SeqCst)
    }

    pub(crate) fn notify(&self) -> &Notify {
        &self.notify
    }

    fn record(&self, event: Value) {
        self.events.lock().push(event);
        self.notify.notify_waiters();
    }
}

/// Verification challenge query
#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub message: Option<String>,
}

/// Challenge answer
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// `hex(HMAC-SHA256(secret, message))`
    pub digest: String,
}

/// Challenge handler
///
/// GET /?message=...
///
/// Answers with the HMAC of the message so Dock Health can mark the
/// webhook as verified.
pub async fn challenge_handler(
    State(state): State<Arc<CallbackState>>,
    Query(query): Query<ChallengeQuery>,
) -> DockResult<Json<ChallengeResponse>> {
    let message = match query.message {
        Some(m) if !m.is_empty() => m,
        _ => {
            tracing::warn!("Verification challenge without message");
            return Err(DockError::Validation(
                "Missing message query parameter".to_string(),
            ));
        }
    };

    let digest = state.signer.sign(&message)?;
    state.challenges.fetch_add(1, Ordering::SeqCst);

    tracing::info!(message = %message, "Answered verification challenge");

    Ok(Json(ChallengeResponse { digest }))
}

/// Event handler
///
/// POST /
///
/// Signature verification is handled by middleware; this records the
/// JSON payload and acknowledges with `{}`.
pub async fn event_handler(
    State(state): State<Arc<CallbackState>>,
    verified: Option<Extension<VerifiedSignature>>,
    body: Bytes,
) -> DockResult<Json<Value>> {
    if body.is_empty() {
        return Err(DockError::Validation("Empty event body".to_string()));
    }

    let event: Value = serde_json::from_slice(&body)?;
    let event_type = event
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown");

    tracing::info!(
        timestamp = verified.as_ref().map(|v| v.timestamp.as_str()).unwrap_or("-"),
        secret_index = verified.as_ref().map(|v| v.secret_index),
        event_type = event_type,
        "Received event"
    );

    state.record(event);

    Ok(Json(json!({})))
}
