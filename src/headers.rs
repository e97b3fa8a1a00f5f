//! Request header builders
//!
//! Every call carries `Authorization` (the raw access token) and `x-api-key`.
//! `/organization` calls additionally name the acting user with `x-user-id`,
//! and most resource calls also name the organization with `x-organization-id`.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::constants::headers;
use crate::error::{DockError, DockResult};

/// Who a request acts as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Developer-account endpoints (`/developer/*`)
    Developer,
    /// A user, without an organization context
    User { user_id: String },
    /// A user acting inside an organization
    UserAndOrg {
        user_id: String,
        organization_id: String,
    },
}

impl Identity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Identity::User {
            user_id: user_id.into(),
        }
    }

    pub fn user_and_org(user_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Identity::UserAndOrg {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
        }
    }

    /// Build the header set for this identity
    pub fn headers(&self, token: &str, api_key: &str) -> DockResult<HeaderMap> {
        match self {
            Identity::Developer => dev_headers(token, api_key),
            Identity::User { user_id } => user_headers(token, api_key, user_id),
            Identity::UserAndOrg {
                user_id,
                organization_id,
            } => user_and_org_headers(token, api_key, user_id, organization_id),
        }
    }
}

/// `Authorization` + `x-api-key`
pub fn dev_headers(token: &str, api_key: &str) -> DockResult<HeaderMap> {
    if token.is_empty() {
        return Err(DockError::MissingValue("Token is undefined!".to_string()));
    }
    if api_key.is_empty() {
        return Err(DockError::MissingValue("API_KEY is undefined!".to_string()));
    }

    let mut map = HeaderMap::new();
    insert(&mut map, headers::AUTHORIZATION, token)?;
    insert(&mut map, headers::API_KEY, api_key)?;
    Ok(map)
}

/// Developer headers plus `x-user-id`
pub fn user_headers(token: &str, api_key: &str, user_id: &str) -> DockResult<HeaderMap> {
    let mut map = dev_headers(token, api_key)?;
    if user_id.is_empty() {
        return Err(DockError::MissingValue("User id is undefined!".to_string()));
    }
    insert(&mut map, headers::USER_ID, user_id)?;
    Ok(map)
}

/// User headers plus `x-organization-id`
pub fn user_and_org_headers(
    token: &str,
    api_key: &str,
    user_id: &str,
    organization_id: &str,
) -> DockResult<HeaderMap> {
    let mut map = user_headers(token, api_key, user_id)?;
    if organization_id.is_empty() {
        return Err(DockError::MissingValue(
            "Organization id is undefined!".to_string(),
        ));
    }
    insert(&mut map, headers::ORGANIZATION_ID, organization_id)?;
    Ok(map)
}

fn insert(map: &mut HeaderMap, name: &str, value: &str) -> DockResult<()> {
    // from_bytes normalizes the name to lowercase
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| DockError::Validation(format!("Invalid header name {}", name)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| DockError::Validation(format!("Invalid value for header {}", name)))?;
    map.insert(header, value);
    Ok(())
}
