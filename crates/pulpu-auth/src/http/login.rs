//! Login initiation and callback handlers.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

use super::{LoginState, STATE_COOKIE_NAME, generate_state};
use crate::error::AuthError;

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, present on success.
    pub code: Option<String>,
    /// Echo of the `state` sent at login.
    pub state: Option<String>,
    /// Error code, present when the user or Google aborted the login.
    pub error: Option<String>,
    /// Human-readable error detail.
    pub error_description: Option<String>,
}

/// `GET /auth/google` - starts a login.
///
/// Stores a fresh `state` in a short-lived cookie and sends the browser to
/// Google's consent screen.
pub async fn begin_auth(
    State(state): State<LoginState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let login_state = generate_state()?;
    let authorization_url = state.provider.authorization_url(&login_state);

    tracing::debug!(provider = %state.provider.provider(), "Starting login");

    let jar = state.remember_state(jar, login_state);
    Ok((jar, Redirect::temporary(authorization_url.as_str())))
}

/// `GET /auth/google/callback` - finishes a login.
///
/// Checks the returned `state` against the cookie, completes the login at
/// Google and issues the session cookie. On any failure no session is
/// written and the error response is returned.
pub async fn complete_auth(
    State(state): State<LoginState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), AuthError> {
    if let Some(error) = params.error {
        tracing::info!(
            error = %error,
            description = params.error_description.as_deref().unwrap_or_default(),
            "Login aborted at identity provider"
        );
        return Err(AuthError::invalid_request(format!(
            "Login was not completed: {error}"
        )));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::invalid_request("Missing authorization code"))?;

    let returned_state = params
        .state
        .ok_or_else(|| AuthError::invalid_request("Missing state parameter"))?;

    let expected_state = jar
        .get(STATE_COOKIE_NAME)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::invalid_request("Login state expired or missing"))?;

    if !bool::from(returned_state.as_bytes().ct_eq(expected_state.as_bytes())) {
        tracing::warn!("Login state mismatch");
        return Err(AuthError::invalid_request("State parameter mismatch"));
    }

    let identity = state.provider.complete(&code).await?;

    let jar = state.forget_state(jar);
    let (jar, session) = state
        .gate
        .establish_session(jar, identity, OffsetDateTime::now_utc())?;

    tracing::info!(
        provider = %session.identity.provider,
        user_id = %session.identity.user_id,
        expires_at = %session.expires_at,
        "Session established"
    );

    Ok((jar, Redirect::to(&state.routes.after_login)))
}
