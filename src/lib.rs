//! Dock Health API client
//!
//! Typed client for the Dock Health REST API, a webhook callback server
//! and end-to-end lifecycle scenarios exercising both.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod models;
pub mod scenarios;
pub mod server;
pub mod token;
pub mod utils;

// Re-export commonly used types
pub use client::{DockClient, EventFilter, Session};
pub use config::AppConfig;
pub use error::{DockError, DockResult};
pub use headers::Identity;
pub use middleware::SignatureState;
pub use scenarios::{ScenarioContext, ScenarioReport};
pub use server::{CallbackHandle, CallbackServer};
pub use token::{Scope, TokenClient};
