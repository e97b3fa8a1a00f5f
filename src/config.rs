//! Configuration management for the Dock Health client
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values, and the flat variable names
//! used by the original example scripts (`AUTH_URL`, `API_KEY`, ...) override
//! everything else.

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::constants::DEFAULT_SETTLE_DELAY_MS;
use crate::error::{DockError, DockResult};

/// Flat environment variables and the keys they populate
const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("AUTH_URL", "api.auth_url"),
    ("API_URL", "api.api_url"),
    ("API_KEY", "api.api_key"),
    ("CLIENT_ID", "api.client_id"),
    ("CLIENT_SECRET", "api.client_secret"),
    ("DOMAIN", "account.domain"),
    ("EMAIL", "account.email"),
    ("USER_IDENTIFIER", "account.user_identifier"),
    ("ORGANIZATION_IDENTIFIER", "account.organization_identifier"),
    ("TASK_LIST_IDENTIFIER", "account.task_list_identifier"),
    ("TASK_GROUP_IDENTIFIER", "account.task_group_identifier"),
    ("CALLBACK_LOCAL_PORT", "callback.local_port"),
    ("CALLBACK_URL", "callback.url"),
    ("CALLBACK_SECRET", "callback.secret"),
];

/// Root configuration structure
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// API endpoints and client credentials
    #[serde(default)]
    pub api: ApiConfig,
    /// The developer account the scenarios act on
    #[serde(default)]
    pub account: AccountConfig,
    /// Local webhook callback server
    #[serde(default)]
    pub callback: CallbackConfig,
    /// Access token caching
    #[serde(default)]
    pub token: TokenConfig,
    /// Scenario timing
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

/// Dock Health API configuration
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// OAuth server base URL (`AUTH_URL`)
    #[serde(default)]
    pub auth_url: Option<String>,
    /// API base URL without the `/api/v1` prefix (`API_URL`)
    #[serde(default)]
    pub api_url: Option<String>,
    /// `x-api-key` value issued by Dock Health (`API_KEY`)
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// OAuth client id (`CLIENT_ID`)
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret (`CLIENT_SECRET`)
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_url: None,
            api_url: None,
            api_key: None,
            client_id: None,
            client_secret: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn auth_url(&self) -> DockResult<&str> {
        required(self.auth_url.as_deref(), "AUTH_URL")
    }

    pub fn api_url(&self) -> DockResult<&str> {
        required(self.api_url.as_deref(), "API_URL")
    }

    pub fn api_key(&self) -> DockResult<&str> {
        required(
            self.api_key.as_ref().map(|s| s.expose_secret().as_str()),
            "API_KEY",
        )
    }

    pub fn client_id(&self) -> DockResult<&str> {
        required(self.client_id.as_deref(), "CLIENT_ID")
    }

    pub fn client_secret(&self) -> DockResult<&str> {
        required(
            self.client_secret
                .as_ref()
                .map(|s| s.expose_secret().as_str()),
            "CLIENT_SECRET",
        )
    }
}

/// Developer account configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountConfig {
    /// Domain of the account's default organization (`DOMAIN`)
    #[serde(default)]
    pub domain: Option<String>,
    /// Email of the account's default user (`EMAIL`)
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_identifier: Option<String>,
    #[serde(default)]
    pub organization_identifier: Option<String>,
    /// Existing task list used when deploying workflows
    #[serde(default)]
    pub task_list_identifier: Option<String>,
    /// Existing task group used when deploying workflows
    #[serde(default)]
    pub task_group_identifier: Option<String>,
}

impl AccountConfig {
    pub fn domain(&self) -> DockResult<&str> {
        required(self.domain.as_deref(), "DOMAIN")
    }

    pub fn email(&self) -> DockResult<&str> {
        required(self.email.as_deref(), "EMAIL")
    }

    pub fn require_user(&self) -> DockResult<&str> {
        required(self.user_identifier.as_deref(), "USER_IDENTIFIER")
    }

    pub fn require_organization(&self) -> DockResult<&str> {
        required(
            self.organization_identifier.as_deref(),
            "ORGANIZATION_IDENTIFIER",
        )
    }

    pub fn require_task_list(&self) -> DockResult<&str> {
        required(self.task_list_identifier.as_deref(), "TASK_LIST_IDENTIFIER")
    }

    pub fn require_task_group(&self) -> DockResult<&str> {
        required(
            self.task_group_identifier.as_deref(),
            "TASK_GROUP_IDENTIFIER",
        )
    }
}

/// Webhook callback server configuration
#[derive(Debug, Deserialize)]
pub struct CallbackConfig {
    /// Host to bind to
    #[serde(default = "default_callback_host")]
    pub host: String,
    /// Port to listen on (`CALLBACK_LOCAL_PORT`); 0 picks a free port
    #[serde(default = "default_callback_port")]
    pub local_port: u16,
    /// Public URL proxying to the local server (`CALLBACK_URL`)
    #[serde(default)]
    pub url: Option<String>,
    /// Shared webhook secret for the standalone server (`CALLBACK_SECRET`)
    #[serde(default)]
    pub secret: Option<SecretString>,
    /// Previous secret, accepted while a webhook is being re-keyed
    #[serde(default)]
    pub secret_previous: Option<SecretString>,
    /// Reject event deliveries whose signature timestamp is further than this from now
    #[serde(default)]
    pub max_timestamp_drift_secs: Option<i64>,
}

fn default_callback_host() -> String {
    "0.0.0.0".to_string()
}

fn default_callback_port() -> u16 {
    3000
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            host: default_callback_host(),
            local_port: default_callback_port(),
            url: None,
            secret: None,
            secret_previous: None,
            max_timestamp_drift_secs: None,
        }
    }
}

impl CallbackConfig {
    pub fn url(&self) -> DockResult<&str> {
        required(self.url.as_deref(), "CALLBACK_URL")
    }

    /// All secrets accepted for signature verification (current + previous)
    pub fn secrets(&self) -> Vec<String> {
        let mut secrets = Vec::new();
        if let Some(ref current) = self.secret {
            secrets.push(current.expose_secret().clone());
        }
        if let Some(ref prev) = self.secret_previous {
            if !prev.expose_secret().is_empty() {
                secrets.push(prev.expose_secret().clone());
            }
        }
        secrets
    }
}

/// Access token cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Maximum number of distinct scope sets cached
    #[serde(default = "default_token_cache_capacity")]
    pub cache_capacity: usize,
    /// Seconds subtracted from `expires_in` before a cached token is considered stale
    #[serde(default = "default_expiry_skew")]
    pub expiry_skew_secs: i64,
}

fn default_token_cache_capacity() -> usize {
    64
}

fn default_expiry_skew() -> i64 {
    30
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_token_cache_capacity(),
            expiry_skew_secs: default_expiry_skew(),
        }
    }
}

/// Scenario timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    /// Wait for asynchronous webhook verification/delivery, in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

fn default_settle_delay() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
        }
    }
}

/// Empty strings count as unset, matching how the scripts treated env vars
fn required<'a>(value: Option<&'a str>, var: &str) -> DockResult<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DockError::MissingValue(format!("{} is undefined!", var))),
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Flat variables (AUTH_URL, API_URL, API_KEY, ...)
    /// 2. Environment variables (DOCK_*)
    /// 3. config/dockhealth.yaml (if exists)
    /// 4. dockhealth.yaml (if exists)
    /// 5. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let builder = base_builder()?
            .add_source(File::with_name("dockhealth").required(false))
            .add_source(File::with_name("config/dockhealth").required(false));

        finish(builder)
    }

    /// Load configuration from an explicit file, still honouring the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = base_builder()?.add_source(File::from(path.as_ref()).required(true));

        finish(builder)
    }

    /// Check that every value the client needs is present
    ///
    /// Reports the first missing value using the flat variable name.
    pub fn validate(&self) -> DockResult<()> {
        self.api.auth_url()?;
        self.api.api_url()?;
        self.api.api_key()?;
        self.api.client_id()?;
        self.api.client_secret()?;
        self.account.domain()?;
        self.account.email()?;

        if self.token.expiry_skew_secs < 0 {
            return Err(DockError::Validation(
                "token.expiry_skew_secs must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

fn base_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("api.timeout_ms", 10000)?
        .set_default("callback.host", "0.0.0.0")?
        .set_default("callback.local_port", 3000)?
        .set_default("token.cache_capacity", 64)?
        .set_default("token.expiry_skew_secs", 30)?
        .set_default("scenario.settle_delay_ms", DEFAULT_SETTLE_DELAY_MS)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    // DOCK_API__AUTH_URL=... -> api.auth_url
    let mut builder = builder.add_source(
        Environment::with_prefix("DOCK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    for (var, key) in LEGACY_ENV_VARS {
        let value = std::env::var(var).ok().filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }

    builder.build()?.try_deserialize()
}

/// Load `.env.<DOCK_ENV>` (if DOCK_ENV is set) and then `.env`
///
/// Values already present in the process environment are never overwritten.
pub fn load_dotenv() {
    if let Ok(env_name) = std::env::var("DOCK_ENV") {
        if dotenvy::from_filename(format!(".env.{}", env_name)).is_ok() {
            tracing::debug!(env = %env_name, "Loaded environment file");
        }
    }
    dotenvy::dotenv().ok();
}
