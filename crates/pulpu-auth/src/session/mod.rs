//! Stateless signed sessions.
//!
//! - [`codec`] turns a [`Session`] into a signed token and back
//! - [`gate`] moves that token in and out of the session cookie
//! - [`key`] holds the HMAC key and generates new ones
//!
//! All operations are pure over their inputs. The only shared state is the
//! immutable [`SecretKey`], so a [`SessionGate`] can be cloned into every
//! request handler without locking.

pub mod codec;
pub mod gate;
pub mod key;

use time::Duration;

pub use codec::{Session, SessionCodec, SessionToken, issue, sign, verify};
pub use gate::SessionGate;
pub use key::{SecretKey, generate_secret_key};

use crate::config::{DEFAULT_COOKIE_NAME, DEFAULT_LOGIN_PATH, DEFAULT_SESSION_DURATION};

/// Runtime session settings, built once at startup.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Signing key.
    pub key: SecretKey,

    /// Lifetime of issued sessions.
    pub duration: Duration,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Where unauthenticated requests are redirected.
    pub login_path: String,
}

impl SessionSettings {
    /// Creates settings with the default lifetime, cookie name and login path.
    #[must_use]
    pub fn new(key: SecretKey) -> Self {
        Self {
            key,
            duration: Duration::seconds(DEFAULT_SESSION_DURATION.as_secs() as i64),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Sets the session lifetime.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    /// Sets the login-initiation path.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }
}
