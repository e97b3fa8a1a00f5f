//! Webhook signature verification
//!
//! Dock Health signs every event delivery with the secret supplied when the
//! webhook was created:
//!
//! ```text
//! X-Dock-Signature-256: t=<timestamp>,v=<hex(HMAC-SHA256(secret, body))>
//! ```
//!
//! The same HMAC answers the verification challenge sent as `GET ?message=`.
//!
//! Secret Rotation:
//! - Supports both current and previous secret while a webhook is being re-keyed
//! - Logs which secret was used for audit purposes

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

use crate::constants::headers::DOCK_SIGNATURE;
use crate::error::{DockError, DockResult};

/// Largest event body accepted for verification
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Timestamps above this are taken to be milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Signature verification state with support for secret rotation
#[derive(Clone)]
pub struct SignatureState {
    /// Valid secrets, current first
    secrets: Arc<Vec<Vec<u8>>>,
    /// Reject deliveries whose timestamp is further than this from now; `None` disables the check
    max_drift_secs: Option<i64>,
}

impl SignatureState {
    /// Create a state with a single secret and no timestamp check
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_rotation(vec![secret.into()], None)
    }

    /// Create a state with multiple secrets
    ///
    /// The first secret is the current one; the rest are previous secrets
    /// still accepted during rotation. Empty secrets are dropped.
    pub fn with_rotation(secrets: Vec<String>, max_drift_secs: Option<i64>) -> Self {
        let secret_bytes: Vec<Vec<u8>> = secrets
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.into_bytes())
            .collect();

        if secret_bytes.is_empty() {
            tracing::warn!("SignatureState created with no valid secrets!");
        }

        Self {
            secrets: Arc::new(secret_bytes),
            max_drift_secs,
        }
    }

    /// Check if rotation is active (multiple secrets configured)
    pub fn is_rotation_active(&self) -> bool {
        self.secrets.len() > 1
    }

    /// Sign a challenge message with the current secret
    pub fn sign(&self, message: &str) -> DockResult<String> {
        let secret = self
            .secrets
            .first()
            .ok_or_else(|| DockError::Server("Unable to sign message!".to_string()))?;
        sign(secret, message.as_bytes())
    }

    /// Verify a parsed header against the raw body
    pub fn verify(&self, body: &[u8], header: &SignatureHeader) -> Verification {
        verify_with_secrets(&self.secrets, body, &header.signature)
    }
}

/// `hex(HMAC-SHA256(secret, message))`, lowercase
pub fn sign(secret: &[u8], message: &[u8]) -> DockResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| {
        DockError::Server("Unable to create verification signature!".to_string())
    })?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Parsed `X-Dock-Signature-256` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: String,
    pub signature: String,
}

impl SignatureHeader {
    /// Parse `t=<timestamp>,v=<signature>`
    ///
    /// Only the positions matter: the first element carries the timestamp and
    /// the second the signature, each after its first `=`.
    pub fn parse(value: &str) -> DockResult<Self> {
        let elems: Vec<&str> = value.split(',').collect();
        if elems.len() < 2 {
            return Err(DockError::Signature(
                "Malformed X-Dock-Signature-256 header".to_string(),
            ));
        }

        let timestamp = element_value(elems[0])
            .ok_or_else(|| DockError::Signature("Malformed timestamp header element".to_string()))?;
        let signature = element_value(elems[1])
            .ok_or_else(|| DockError::Signature("Malformed signature header element".to_string()))?;

        if timestamp.is_empty() {
            return Err(DockError::Signature("Missing timestamp".to_string()));
        }

        Ok(Self {
            timestamp: timestamp.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Timestamp in seconds, if it is numeric
    pub fn timestamp_secs(&self) -> Option<i64> {
        self.timestamp.parse::<i64>().ok().map(normalize_timestamp)
    }
}

/// Text between the first and second `=` of `key=value`
fn element_value(elem: &str) -> Option<&str> {
    let mut parts = elem.split('=');
    parts.next();
    parts.next()
}

/// Accept both seconds and milliseconds since the epoch
pub fn normalize_timestamp(ts: i64) -> i64 {
    if ts > MILLIS_THRESHOLD {
        ts / 1000
    } else {
        ts
    }
}

/// Result of signature verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Signature matched using secret at given index
    Valid { secret_index: usize },
    /// No secrets matched
    Invalid,
}

/// Verify a signature against every secret, current first
pub fn verify_with_secrets(secrets: &[Vec<u8>], body: &[u8], signature: &str) -> Verification {
    for (index, secret) in secrets.iter().enumerate() {
        let expected = match sign(secret, body) {
            Ok(s) => s,
            Err(_) => {
                tracing::error!(secret_index = index, "Failed to create HMAC instance");
                continue;
            }
        };

        if constant_time_compare(signature, &expected) {
            return Verification::Valid {
                secret_index: index,
            };
        }
    }

    Verification::Invalid
}

/// Constant-time string comparison; case-sensitive
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Attached to verified requests for the event handler
#[derive(Debug, Clone)]
pub struct VerifiedSignature {
    pub timestamp: String,
    pub secret_index: usize,
}

/// Signature verification middleware for event deliveries
///
/// - header missing: 500
/// - header malformed, timestamp out of window, or signature mismatch: 400
pub async fn verify_signature(
    State(state): State<Arc<SignatureState>>,
    request: Request,
    next: Next,
) -> Response {
    // HeaderMap lookups are case-insensitive
    let raw_header = match request.headers().get(DOCK_SIGNATURE) {
        Some(value) => match value.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid signature header encoding",
                );
            }
        },
        None => {
            tracing::error!("X-Dock-Signature-256 header missing.");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "X-Dock-Signature-256 header missing",
            );
        }
    };

    let header = match SignatureHeader::parse(&raw_header) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(header = %raw_header, error = %e, "Rejecting event delivery");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    // Check timestamp drift (replay protection)
    if let Some(max_drift) = state.max_drift_secs {
        let Some(timestamp) = header.timestamp_secs() else {
            return error_response(StatusCode::BAD_REQUEST, "Invalid timestamp format");
        };

        let now = Utc::now().timestamp();
        let drift = now.abs_diff(timestamp);
        if drift > max_drift.unsigned_abs() {
            tracing::warn!(
                timestamp = timestamp,
                now = now,
                drift = drift,
                max_drift = max_drift,
                "Event timestamp outside acceptable window"
            );
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Request expired (drift: {}s, max: {}s)", drift, max_drift),
            );
        }
    }

    // Read body for signature verification
    let (mut parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    match state.verify(&body_bytes, &header) {
        Verification::Valid { secret_index } => {
            if secret_index > 0 {
                tracing::info!(
                    secret_index = secret_index,
                    "Signature verified with rotated secret (grace period active)"
                );
            } else {
                tracing::debug!(
                    timestamp = %header.timestamp,
                    body_size = body_bytes.len(),
                    "Signature valid."
                );
            }

            parts.extensions.insert(VerifiedSignature {
                timestamp: header.timestamp,
                secret_index,
            });

            // Reconstruct request with body and continue
            let request = Request::from_parts(parts, Body::from(body_bytes));
            next.run(request).await
        }
        Verification::Invalid => {
            tracing::error!(
                provided_signature = %header.signature,
                secrets_tried = state.secrets.len(),
                "Signature invalid."
            );
            error_response(StatusCode::BAD_REQUEST, "Signature invalid")
        }
    }
}

/// Create an error response
fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "status": "rejected",
        "reason": "signature_verification_failed",
        "details": message
    });

    (status, Json(body)).into_response()
}
