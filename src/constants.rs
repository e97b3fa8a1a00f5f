/// HTTP header names used by the Dock Health API and its webhook callbacks
///
/// Header names are case-insensitive on the wire; `http::HeaderName` lowercases
/// them, so lookups through `HeaderMap` match any casing the sender used.
pub mod headers {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const API_KEY: &str = "x-api-key";
    pub const USER_ID: &str = "x-user-id";
    pub const ORGANIZATION_ID: &str = "x-organization-id";
    /// Signature header on webhook event deliveries: `t=<timestamp>,v=<hex signature>`
    pub const DOCK_SIGNATURE: &str = "x-dock-signature-256";
}

/// API paths
pub mod paths {
    /// Versioned API prefix appended to `API_URL`
    pub const API_PREFIX: &str = "/api/v1";
    /// Client-credentials token endpoint appended to `AUTH_URL`
    pub const TOKEN: &str = "/oauth2/token";
}

/// Length of the random part of generated emails, domains and MRNs
pub const GENERATED_ITEM_LENGTH: usize = 8;

/// Length of generated webhook identifiers and secrets
pub const WEBHOOK_IDENTIFIER_LENGTH: usize = 36;

/// Default wait for asynchronous webhook verification and delivery
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 5000;
