//! HTTP handlers for the webhook callback server

mod callback;

pub use callback::*;
