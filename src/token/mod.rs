//! OAuth2 client-credentials token acquisition
//!
//! Exchanges `client_id`/`client_secret` for a bearer token scoped to a set
//! of Dock Health permissions. Tokens are cached per scope set until shortly
//! before they expire.

pub mod cache;

pub use cache::TokenCache;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::config::AppConfig;
use crate::constants::paths;
use crate::error::{DockError, DockResult};

/// API permission scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    UserAllRead,
    UserAllWrite,
    PatientAllRead,
    PatientAllWrite,
    SystemOrgRead,
    SystemOrgWrite,
    SystemUserRead,
    SystemUserWrite,
    SystemDeveloperRead,
    SystemDeveloperWrite,
}

impl Scope {
    pub const ALL: [Scope; 10] = [
        Scope::UserAllRead,
        Scope::UserAllWrite,
        Scope::PatientAllRead,
        Scope::PatientAllWrite,
        Scope::SystemOrgRead,
        Scope::SystemOrgWrite,
        Scope::SystemUserRead,
        Scope::SystemUserWrite,
        Scope::SystemDeveloperRead,
        Scope::SystemDeveloperWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::UserAllRead => "dockhealth/user.all.read",
            Scope::UserAllWrite => "dockhealth/user.all.write",
            Scope::PatientAllRead => "dockhealth/patient.all.read",
            Scope::PatientAllWrite => "dockhealth/patient.all.write",
            Scope::SystemOrgRead => "dockhealth/system.org.read",
            Scope::SystemOrgWrite => "dockhealth/system.org.write",
            Scope::SystemUserRead => "dockhealth/system.user.read",
            Scope::SystemUserWrite => "dockhealth/system.user.write",
            Scope::SystemDeveloperRead => "dockhealth/system.developer.read",
            Scope::SystemDeveloperWrite => "dockhealth/system.developer.write",
        }
    }

    /// Scopes MUST be space delimited or the token request fails
    pub fn join(scopes: &[Scope]) -> String {
        scopes
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = DockError;

    /// Accepts the full name (`dockhealth/user.all.read`) or the bare suffix (`user.all.read`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let full = if s.starts_with("dockhealth/") {
            s.to_string()
        } else {
            format!("dockhealth/{}", s)
        };

        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == full)
            .ok_or_else(|| DockError::Validation(format!("Unknown scope: {}", s)))
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Client-credentials token client
pub struct TokenClient {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    cache: TokenCache,
}

impl TokenClient {
    /// Create a token client from validated configuration
    pub fn new(client: Client, config: &AppConfig) -> DockResult<Self> {
        let auth_url = config.api.auth_url()?;
        Ok(Self {
            client,
            token_url: format!("{}{}", auth_url.trim_end_matches('/'), paths::TOKEN),
            client_id: config.api.client_id()?.to_string(),
            client_secret: SecretString::new(config.api.client_secret()?.to_string()),
            cache: TokenCache::new(
                config.token.cache_capacity,
                config.token.expiry_skew_secs,
            ),
        })
    }

    /// Get an access token for the given scopes, from cache when still valid
    pub async fn get_access_token(&self, scopes: &[Scope]) -> DockResult<String> {
        if scopes.is_empty() {
            return Err(DockError::Token("Scopes are not defined!".to_string()));
        }

        if let Some(token) = self.cache.get(scopes) {
            return Ok(token);
        }

        let response = self.request_token(scopes).await?;
        self.cache
            .insert(scopes, response.access_token.clone(), response.expires_in);

        Ok(response.access_token)
    }

    /// Request a fresh token, bypassing the cache
    pub async fn request_token(&self, scopes: &[Scope]) -> DockResult<TokenResponse> {
        if scopes.is_empty() {
            return Err(DockError::Token("Scopes are not defined!".to_string()));
        }

        let scope = Scope::join(scopes);
        tracing::debug!(scope = %scope, url = %self.token_url, "Requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self.client.post(&self.token_url).form(&form).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), scope = %scope, "Token request rejected");
            return Err(DockError::UnexpectedStatus {
                method: "POST".to_string(),
                url: self.token_url.clone(),
                expected: StatusCode::OK.as_u16(),
                actual: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DockError::Token(format!("Failed to parse token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(DockError::Token(
                "Token response carried an empty access_token".to_string(),
            ));
        }

        tracing::debug!(
            scope = %scope,
            expires_in = token.expires_in,
            "Access token acquired"
        );

        Ok(token)
    }

    /// Drop every cached token
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    pub fn cached_tokens(&self) -> usize {
        self.cache.len()
    }
}
