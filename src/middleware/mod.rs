//! Middleware for the webhook callback server
//!
//! Verifies the `X-Dock-Signature-256` header on event deliveries

mod signature;

pub use signature::*;
