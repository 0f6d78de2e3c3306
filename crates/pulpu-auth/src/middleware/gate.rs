//! Gate and anti-gate middleware.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use time::OffsetDateTime;

use crate::session::SessionGate;

/// Admits requests with a valid session and redirects the rest to login.
///
/// On success the verified [`Session`](crate::Session) is stored in the
/// request extensions and the downstream handler runs; the gate itself
/// writes nothing to the response. On any failure, including a missing
/// cookie, the handler is not invoked and the client is sent to the
/// gate's login path. The failure reason is logged, never returned.
pub async fn require_session(
    State(gate): State<SessionGate>,
    mut req: Request,
    next: Next,
) -> Response {
    match gate.require_session(req.headers(), OffsetDateTime::now_utc()) {
        Ok(session) => {
            tracing::debug!(
                provider = %session.identity.provider,
                user_id = %session.identity.user_id,
                path = %req.uri().path(),
                "Session verified"
            );
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(reason) => {
            tracing::debug!(
                reason = reason.as_str(),
                path = %req.uri().path(),
                "No valid session, redirecting to login"
            );
            Redirect::to(gate.login_path()).into_response()
        }
    }
}

/// State for [`redirect_if_authenticated`].
#[derive(Debug, Clone)]
pub struct AntiGate {
    gate: SessionGate,
    redirect_to: Arc<str>,
}

impl AntiGate {
    /// Creates an anti-gate that sends authenticated users to `redirect_to`.
    #[must_use]
    pub fn new(gate: SessionGate, redirect_to: impl Into<Arc<str>>) -> Self {
        Self {
            gate,
            redirect_to: redirect_to.into(),
        }
    }

    /// Redirect target for authenticated users.
    #[must_use]
    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }
}

/// Inverse of [`require_session`], for login and landing pages.
///
/// Requests with a valid session are redirected to the anti-gate's target
/// without invoking the handler; all others pass through unchanged.
pub async fn redirect_if_authenticated(
    State(anti): State<AntiGate>,
    req: Request,
    next: Next,
) -> Response {
    match anti
        .gate
        .require_session(req.headers(), OffsetDateTime::now_utc())
    {
        Ok(session) => {
            tracing::debug!(
                user_id = %session.identity.user_id,
                target = anti.redirect_to(),
                "Already authenticated, skipping page"
            );
            Redirect::to(anti.redirect_to()).into_response()
        }
        Err(_) => next.run(req).await,
    }
}
