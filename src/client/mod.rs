//! Typed client for the Dock Health REST API
//!
//! Every call is a single request: build the URL under `<API_URL>/api/v1`,
//! attach the identity headers, send, and require one exact status code.
//! There is no retry; an unexpected status is returned as
//! [`DockError::UnexpectedStatus`].

mod developer;
mod fields;
mod organizations;
mod patients;
mod profiles;
mod tasks;
mod users;
mod webhooks;
mod workflows;

pub use developer::EventFilter;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::constants::paths;
use crate::error::{DockError, DockResult};
use crate::headers::Identity;
use crate::token::{Scope, TokenClient};

/// An access token paired with the identity requests are made as
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    identity: Identity,
}

impl Session {
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Same token, acting as someone else
    pub fn with_identity(&self, identity: Identity) -> Self {
        Self {
            token: self.token.clone(),
            identity,
        }
    }
}

/// Dock Health API client
pub struct DockClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    tokens: Arc<TokenClient>,
}

impl DockClient {
    /// Create a client from configuration
    ///
    /// Fails with the flat variable name when a required value is missing.
    pub fn new(config: &AppConfig) -> DockResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.api.timeout_ms))
            .build()?;

        let base_url = format!(
            "{}{}",
            config.api.api_url()?.trim_end_matches('/'),
            paths::API_PREFIX
        );
        let tokens = Arc::new(TokenClient::new(http.clone(), config)?);

        Ok(Self {
            http,
            base_url,
            api_key: SecretString::new(config.api.api_key()?.to_string()),
            tokens,
        })
    }

    /// `<API_URL>/api/v1`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenClient {
        &self.tokens
    }

    /// Obtain a token for `scopes` and act as `identity`
    pub async fn session(&self, scopes: &[Scope], identity: Identity) -> DockResult<Session> {
        let token = self.tokens.get_access_token(scopes).await?;
        Ok(Session::new(token, identity))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, &str)],
    ) -> DockResult<T> {
        let url = self.url(path);
        let request = self.http.get(&url).query(query);
        self.execute(session, Method::GET, url, request, StatusCode::OK)
            .await
    }

    pub(crate) async fn post<B, T>(&self, session: &Session, path: &str, body: &B) -> DockResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.http.post(&url).json(body);
        self.execute(session, Method::POST, url, request, StatusCode::OK)
            .await
    }

    pub(crate) async fn patch<B, T>(&self, session: &Session, path: &str, body: &B) -> DockResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.http.patch(&url).json(body);
        self.execute(session, Method::PATCH, url, request, StatusCode::OK)
            .await
    }

    /// PATCH without a body (`/select/{outcomeId}`)
    pub(crate) async fn patch_empty<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> DockResult<T> {
        let url = self.url(path);
        let request = self.http.patch(&url);
        self.execute(session, Method::PATCH, url, request, StatusCode::OK)
            .await
    }

    pub(crate) async fn put<B, T>(&self, session: &Session, path: &str, body: &B) -> DockResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.http.put(&url).json(body);
        self.execute(session, Method::PUT, url, request, StatusCode::OK)
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        expected: StatusCode,
    ) -> DockResult<T> {
        let url = self.url(path);
        let request = self.http.delete(&url);
        self.execute(session, Method::DELETE, url, request, expected)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send the request and decode the body when the status matches
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<_>` work for
    /// `204 No Content` answers.
    async fn execute<T: DeserializeOwned>(
        &self,
        session: &Session,
        method: Method,
        url: String,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> DockResult<T> {
        let headers = session
            .identity
            .headers(&session.token, self.api_key.expose_secret())?;

        let response = request.headers(headers).send().await?;
        let status = response.status();

        tracing::debug!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            "Dock Health API call"
        );

        if status != expected {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                method = %method,
                url = %url,
                expected = expected.as_u16(),
                actual = status.as_u16(),
                "Unexpected API status"
            );
            return Err(DockError::UnexpectedStatus {
                method: method.to_string(),
                url,
                expected: expected.as_u16(),
                actual: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"null")?);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}
