//! Client configuration.
//!
//! `ClientConfig` controls where the storefront API lives, how the
//! transport reports failures, which storage keys hold the persisted state and
//! how long notifications stay visible.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use storefront_engine::config::ClientConfig;
//! let cfg = ClientConfig::default();
//! assert_eq!(cfg.failure_status, 400);
//! assert_eq!(cfg.endpoints.login, "/api/login");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use storefront_engine::config::ClientConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ClientConfig::builder()
//!     .base_url("https://shop.example")
//!     .user_agent("Storefront/0.1")
//!     .token_key("auth_token")
//!     .build()?; // returns Result<ClientConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`ConfigError`] when the base URL is not an
//! http(s) URL, the failure status is not a 4xx/5xx code, a storage key is
//! empty, or a notification lifetime is zero.

use crate::net::DEFAULT_FAILURE_STATUS;
use crate::notify::NotificationLife;
use crate::storage::{DEFAULT_CART_KEY, DEFAULT_TOKEN_KEY};
use std::time::Duration;
use url::Url;

const DEFAULT_USER_AGENT: &str = "StorefrontEngine/0.1";
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_EXPORT_FILENAME: &str = "file_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// REST endpoints used by the session protocol and the admin stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub forgot_password: String,
    /// "Who am I" endpoint used to validate a persisted token.
    pub whoami: String,
    pub logout: String,
    /// Prefix of the admin collections (`<admin_base>/<collection>`).
    pub admin_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/login".into(),
            register: "/api/register".into(),
            forgot_password: "/api/forgot-password".into(),
            whoami: "/api/user-name".into(),
            logout: "/api/logout".into(),
            admin_base: "/api/admin".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relative request URIs resolve against this URL.
    pub base_url: Url,
    pub user_agent: String,
    /// `None` waits for the server indefinitely.
    pub request_timeout: Option<Duration>,
    /// Status reported for calls that never produced a usable response.
    pub failure_status: u16,
    pub token_key: String,
    pub cart_key: String,
    /// Filename used when an export response does not suggest one.
    pub default_export_filename: String,
    pub endpoints: Endpoints,
    pub notification_life: NotificationLife,
    pub log_level: LogLevel,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
            failure_status: DEFAULT_FAILURE_STATUS,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            cart_key: DEFAULT_CART_KEY.to_string(),
            default_export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            endpoints: Endpoints::default(),
            notification_life: NotificationLife::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    inner: ClientConfig,
    base_url: Option<String>,
}

impl ClientConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ClientConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn request_timeout(self, t: Duration) -> Self { self.map(|c| c.request_timeout = Some(t)) }
    pub fn failure_status(self, status: u16) -> Self { self.map(|c| c.failure_status = status) }
    pub fn token_key<S: Into<String>>(self, key: S) -> Self { self.map(|c| c.token_key = key.into()) }
    pub fn cart_key<S: Into<String>>(self, key: S) -> Self { self.map(|c| c.cart_key = key.into()) }
    pub fn default_export_filename<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.default_export_filename = name.into()) }
    pub fn endpoints(self, endpoints: Endpoints) -> Self { self.map(|c| c.endpoints = endpoints) }
    pub fn notification_life(self, life: NotificationLife) -> Self { self.map(|c| c.notification_life = life) }
    pub fn log_level(self, level: LogLevel) -> Self { self.map(|c| c.log_level = level) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ClientConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(mut self) -> Result<ClientConfig, ConfigError> {
        if let Some(raw) = self.base_url.take() {
            self.inner.base_url = Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl {
                url: raw.clone(),
                reason: e.to_string(),
            })?;
        }
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("base URL {url:?} is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failure status {0} must be a 4xx or 5xx code")]
    InvalidFailureStatus(u16),

    #[error("storage key for {0} must not be empty")]
    EmptyStorageKey(&'static str),

    #[error("token and cart must use different storage keys")]
    SharedStorageKey,

    #[error("notification lifetime must be non-zero")]
    ZeroNotificationLife,
}

fn validate(c: &ClientConfig) -> Result<(), ConfigError> {
    if !matches!(c.base_url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: c.base_url.to_string(),
            reason: "scheme must be http or https".into(),
        });
    }
    if !(400..=599).contains(&c.failure_status) {
        return Err(ConfigError::InvalidFailureStatus(c.failure_status));
    }
    if c.token_key.is_empty() {
        return Err(ConfigError::EmptyStorageKey("token"));
    }
    if c.cart_key.is_empty() {
        return Err(ConfigError::EmptyStorageKey("cart"));
    }
    if c.token_key == c.cart_key {
        return Err(ConfigError::SharedStorageKey);
    }
    let life = &c.notification_life;
    if life.success.is_zero() || life.session.is_zero() || life.error.is_zero() {
        return Err(ConfigError::ZeroNotificationLife);
    }
    Ok(())
}
