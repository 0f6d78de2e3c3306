//! Authentication configuration.
//!
//! Configuration types for signed sessions, the Google identity provider and
//! the routes of the login flow. The server loads these from TOML and
//! environment variables; [`AuthConfig::validate`] must pass before any of it
//! is turned into runtime state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::session::{SecretKey, SessionSettings};

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "pulpu_session";

/// Default login-initiation path; unauthenticated requests are sent here.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/google";

/// Default session lifetime.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(24 * 3600);

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth.session]
/// secret_key = "<64 hex characters>"
/// duration = "24h"
///
/// [auth.google]
/// client_id = "1234.apps.googleusercontent.com"
/// client_secret = "..."
/// callback_url = "https://pulpu.example.com/auth/google/callback"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Signed session settings.
    pub session: SessionConfig,

    /// Google OAuth client settings.
    pub google: GoogleConfig,

    /// Where the login flow sends the browser.
    pub routes: RoutesConfig,
}

/// Signed session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hex-encoded HMAC key, at least 32 bytes once decoded.
    /// Generate one with `pulpu-server generate-secret`.
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,

    /// How long an issued session stays valid.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Name of the session cookie.
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            duration: DEFAULT_SESSION_DURATION,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

/// Google OAuth 2.0 client configuration.
///
/// Endpoints default to Google's production endpoints and only need to be
/// overridden in tests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret.
    #[serde(skip_serializing)]
    pub client_secret: String,

    /// Redirect URI registered with Google.
    pub callback_url: String,

    /// Authorization endpoint.
    pub authorization_endpoint: String,

    /// Token endpoint.
    pub token_endpoint: String,

    /// OpenID Connect userinfo endpoint.
    pub userinfo_endpoint: String,

    /// Scopes requested at login.
    pub scopes: Vec<String>,

    /// Timeout for calls to Google.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: "http://localhost:8080/auth/google/callback".to_string(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Paths used by the login flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Login-initiation endpoint; unauthenticated requests are sent here.
    pub login: String,

    /// Logout endpoint.
    pub logout: String,

    /// Landing page after a successful login.
    pub after_login: String,

    /// Landing page after logout.
    pub after_logout: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_string(),
            logout: "/logout/google".to_string(),
            after_login: "/protected".to_string(),
            after_logout: "/".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the session secret or Google client
    /// credentials are absent, and `ConfigError::InvalidValue` if:
    /// - The secret is not hex or shorter than 32 bytes
    /// - The session duration is zero
    /// - The cookie name is not a valid cookie token
    /// - A URL or route path does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.secret()?;
        self.session.validate()?;
        self.google.validate()?;
        self.routes.validate()?;
        self.validate_route_layout()?;
        Ok(())
    }

    /// Paths served by the login flow and the gated landing page, keyed by
    /// the setting they come from.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the callback URL does not parse.
    pub fn route_paths(&self) -> Result<Vec<(&'static str, String)>, ConfigError> {
        let callback = Url::parse(&self.google.callback_url).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "auth.google.callback_url '{}': {e}",
                self.google.callback_url
            ))
        })?;
        Ok(vec![
            ("auth.routes.login", self.routes.login.clone()),
            ("auth.routes.logout", self.routes.logout.clone()),
            ("auth.routes.after_login", self.routes.after_login.clone()),
            ("auth.google.callback_url", callback.path().to_string()),
        ])
    }

    fn validate_route_layout(&self) -> Result<(), ConfigError> {
        // Gate sends to login, anti-gate on login sends to after_login.
        if self.routes.after_login == self.routes.login {
            return Err(ConfigError::InvalidValue(format!(
                "auth.routes.after_login must differ from auth.routes.login ('{}')",
                self.routes.login
            )));
        }
        if self.routes.after_logout == self.routes.logout {
            return Err(ConfigError::InvalidValue(format!(
                "auth.routes.after_logout must differ from auth.routes.logout ('{}')",
                self.routes.logout
            )));
        }

        let paths = self.route_paths()?;
        for (i, (field, path)) in paths.iter().enumerate() {
            if let Some((other, _)) = paths[..i].iter().find(|(_, p)| p == path) {
                return Err(ConfigError::InvalidValue(format!(
                    "{other} and {field} both use path '{path}'"
                )));
            }
        }
        Ok(())
    }

    /// Builds the runtime session settings.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`AuthConfig::validate`] for the session
    /// and routes sections.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        self.session.validate()?;
        self.routes.validate()?;
        let duration = time::Duration::try_from(self.session.duration).map_err(|_| {
            ConfigError::InvalidValue("auth.session.duration is out of range".to_string())
        })?;
        Ok(SessionSettings::new(self.session.secret()?)
            .with_duration(duration)
            .with_cookie_name(self.session.cookie_name.clone())
            .with_login_path(self.routes.login.clone()))
    }
}

impl SessionConfig {
    /// Decodes the configured secret key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no key is configured and
    /// `ConfigError::InvalidValue` if it is not valid hex or is too short.
    pub fn secret(&self) -> Result<SecretKey, ConfigError> {
        let hex_key = self
            .secret_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Missing("auth.session.secret_key".to_string()))?;
        SecretKey::from_hex(hex_key)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.session.duration must be > 0".to_string(),
            ));
        }

        let expiry_representable = time::Duration::try_from(self.duration)
            .ok()
            .and_then(|d| OffsetDateTime::now_utc().checked_add(d))
            .is_some();
        if !expiry_representable {
            return Err(ConfigError::InvalidValue(format!(
                "auth.session.duration {:?} is too long",
                self.duration
            )));
        }

        if !is_cookie_token(&self.cookie_name) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.session.cookie_name '{}' is not a valid cookie name",
                self.cookie_name
            )));
        }

        Ok(())
    }
}

impl GoogleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::Missing("auth.google.client_id".to_string()));
        }

        if self.client_secret.is_empty() {
            return Err(ConfigError::Missing("auth.google.client_secret".to_string()));
        }

        for (field, value) in [
            ("callback_url", &self.callback_url),
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
            ("userinfo_endpoint", &self.userinfo_endpoint),
        ] {
            Url::parse(value).map_err(|e| {
                ConfigError::InvalidValue(format!("auth.google.{field} '{value}': {e}"))
            })?;
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.google.request_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl RoutesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("login", &self.login),
            ("logout", &self.logout),
            ("after_login", &self.after_login),
            ("after_logout", &self.after_logout),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "auth.routes.{field} must start with '/'"
                )));
            }
        }
        Ok(())
    }
}

/// RFC 6265 cookie-name token characters.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
