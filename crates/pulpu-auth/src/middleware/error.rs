//! HTTP error responses for authentication failures.
//!
//! Session failures collapse to one generic body so a client cannot tell a
//! bad signature from an expired session. Server-side failures are logged
//! with their details and answered with a generic description.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, description) = error_details(&self);

        if status.is_server_error() {
            tracing::error!(
                category = %self.category(),
                error = %self,
                "Authentication request failed"
            );
        } else {
            tracing::debug!(category = %self.category(), error = %self, "Authentication request rejected");
        }

        (status, Json(error_json(self.error_code(), &description))).into_response()
    }
}

/// Builds the JSON error body used by auth endpoints.
#[must_use]
pub fn error_json(code: &str, description: &str) -> Value {
    json!({
        "error": code,
        "error_description": description,
    })
}

/// Returns (HTTP status, client-facing description).
fn error_details(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::InvalidSession(_) => (
            StatusCode::UNAUTHORIZED,
            "Authentication required".to_string(),
        ),
        AuthError::InvalidRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AuthError::IdentityProvider { provider, .. } => (
            StatusCode::BAD_GATEWAY,
            format!("Authentication with {provider} failed"),
        ),
        AuthError::Serialization { .. }
        | AuthError::Entropy { .. }
        | AuthError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session creation failed".to_string(),
        ),
    }
}
