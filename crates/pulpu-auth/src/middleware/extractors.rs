//! Session extractors for handlers.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use time::OffsetDateTime;

use crate::error::{AuthError, InvalidSession};
use crate::session::{Session, SessionGate};

/// The session verified by [`require_session`](super::require_session).
///
/// Only valid on routes behind the gate middleware; elsewhere it rejects
/// with `401 Unauthorized`.
///
/// # Example
///
/// ```ignore
/// async fn handler(CurrentSession(session): CurrentSession) -> String {
///     session.identity.user_id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AuthError::InvalidSession(InvalidSession::MissingCookie))
    }
}

/// The request's session if it carries a valid one.
///
/// Works on any route: uses the session stored by the gate when present,
/// otherwise verifies the cookie itself. Never rejects.
///
/// # Example
///
/// ```ignore
/// async fn handler(OptionalSession(session): OptionalSession) -> String {
///     match session {
///         Some(s) => format!("Hello, {}!", s.identity.display_name()),
///         None => "Hello, anonymous!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<Session>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
    SessionGate: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(OptionalSession(Some(session.clone())));
        }

        let gate = SessionGate::from_ref(state);
        match gate.require_session(&parts.headers, OffsetDateTime::now_utc()) {
            Ok(session) => Ok(OptionalSession(Some(session))),
            Err(reason) => {
                if reason.is_rejected_token() {
                    tracing::debug!(reason = reason.as_str(), "Ignoring invalid session cookie");
                }
                Ok(OptionalSession(None))
            }
        }
    }
}
