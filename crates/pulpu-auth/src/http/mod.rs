//! Login flow endpoints.
//!
//! - `GET {routes.login}` - start a Google login ([`login::begin_auth`])
//! - `GET {callback path}` - finish it and issue the session
//!   ([`login::complete_auth`])
//! - `GET {routes.logout}` - drop the session ([`logout::logout`])
//!
//! # Usage
//!
//! ```ignore
//! use pulpu_auth::http::{LoginState, auth_routes};
//!
//! let app = Router::new()
//!     .merge(auth_routes(LoginState::new(gate, provider, routes)));
//! ```

pub mod login;
pub mod logout;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::middleware;
use axum::routing::get;
use axum_extra::extract::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cookie::{Cookie, SameSite};
use rand::RngCore;
use rand::rngs::OsRng;
use time::{Duration, OffsetDateTime};

use crate::config::RoutesConfig;
use crate::error::AuthError;
use crate::middleware::{AntiGate, redirect_if_authenticated};
use crate::provider::GoogleProvider;
use crate::session::SessionGate;

pub use login::{CallbackParams, begin_auth, complete_auth};
pub use logout::logout;

/// Cookie holding the anti-CSRF `state` of a login in progress.
pub const STATE_COOKIE_NAME: &str = "pulpu_oauth_state";

/// How long a started login may take before its state cookie expires.
pub const STATE_COOKIE_TTL: Duration = Duration::minutes(10);

/// Random bytes in a generated `state` value.
const STATE_LENGTH: usize = 32;

/// State shared by the login flow handlers.
#[derive(Clone)]
pub struct LoginState {
    /// Issues and clears the session cookie.
    pub gate: SessionGate,
    /// Google OAuth client.
    pub provider: Arc<GoogleProvider>,
    /// Login, logout and redirect paths.
    pub routes: RoutesConfig,
}

impl FromRef<LoginState> for SessionGate {
    fn from_ref(state: &LoginState) -> Self {
        state.gate.clone()
    }
}

impl LoginState {
    /// Creates handler state.
    #[must_use]
    pub fn new(gate: SessionGate, provider: Arc<GoogleProvider>, routes: RoutesConfig) -> Self {
        Self {
            gate,
            provider,
            routes,
        }
    }

    /// Adds the state cookie for a login in progress.
    pub(crate) fn remember_state(&self, jar: CookieJar, value: String) -> CookieJar {
        let expires = OffsetDateTime::now_utc() + STATE_COOKIE_TTL;
        jar.add(self.state_cookie(value, expires))
    }

    /// Overwrites the state cookie with an empty, already expired one.
    pub(crate) fn forget_state(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.state_cookie(String::new(), OffsetDateTime::UNIX_EPOCH))
    }

    /// Only the callback ever reads the state cookie, so it is scoped to it.
    fn state_cookie(&self, value: String, expires: OffsetDateTime) -> Cookie<'static> {
        Cookie::build((STATE_COOKIE_NAME, value))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Lax)
            .path(self.provider.callback_path().to_string())
            .expires(expires)
            .build()
    }
}

/// Builds the router for the login flow.
///
/// The login route sits behind [`redirect_if_authenticated`], so a user who
/// already has a valid session goes straight to `routes.after_login`.
pub fn auth_routes(state: LoginState) -> Router {
    let anti_gate = AntiGate::new(state.gate.clone(), state.routes.after_login.as_str());

    let login = Router::new()
        .route(&state.routes.login, get(begin_auth))
        .route_layer(middleware::from_fn_with_state(
            anti_gate,
            redirect_if_authenticated,
        ));

    Router::new()
        .route(state.provider.callback_path(), get(complete_auth))
        .route(&state.routes.logout, get(logout))
        .merge(login)
        .with_state(state)
}

/// Generates an unguessable `state` value for a new login.
pub(crate) fn generate_state() -> Result<String, AuthError> {
    let mut bytes = [0u8; STATE_LENGTH];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::entropy(format!("failed to generate login state: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state_is_random_and_cookie_safe() {
        let a = generate_state().unwrap();
        let b = generate_state().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.bytes()
                .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
        );
    }
}
