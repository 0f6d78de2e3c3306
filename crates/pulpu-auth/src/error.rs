//! Authentication error types.
//!
//! [`InvalidSession`] describes why a session cookie was not accepted. It is
//! reported to logs only; every variant leads to the same response at the
//! gate. [`AuthError`] covers everything else that can go wrong while
//! configuring sessions or running the login flow.

use std::fmt;

/// Reasons a session token is rejected.
///
/// The variants are listed in the order verification checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum InvalidSession {
    /// No session cookie was sent with the request.
    #[error("session cookie is missing")]
    MissingCookie,

    /// The token does not consist of exactly two `.`-separated segments.
    #[error("session token is malformed")]
    MalformedFormat,

    /// A segment of the token is not valid base64url.
    #[error("session token encoding is invalid")]
    MalformedEncoding,

    /// The HMAC does not match the payload.
    #[error("session signature mismatch")]
    SignatureMismatch,

    /// The authenticated payload is not a session.
    #[error("session payload is malformed")]
    MalformedPayload,

    /// The session is past its expiry.
    #[error("session expired")]
    Expired,
}

impl InvalidSession {
    /// Short machine-readable name, used as a log field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCookie => "missing_cookie",
            Self::MalformedFormat => "malformed_format",
            Self::MalformedEncoding => "malformed_encoding",
            Self::SignatureMismatch => "signature_mismatch",
            Self::MalformedPayload => "malformed_payload",
            Self::Expired => "expired",
        }
    }

    /// Returns `true` if the client presented a token that failed to verify,
    /// as opposed to presenting none at all.
    #[must_use]
    pub fn is_rejected_token(&self) -> bool {
        !matches!(self, Self::MissingCookie)
    }
}

/// Errors that can occur while issuing sessions or running the login flow.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The session could not be verified.
    #[error("Invalid session: {0}")]
    InvalidSession(#[from] InvalidSession),

    /// The request is missing a parameter or carries a bad one.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The session payload could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The operating system entropy source failed.
    #[error("Entropy source failure: {message}")]
    Entropy {
        /// Description of the failure reported by the RNG.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// The identity provider returned an error or an unusable response.
    #[error("Identity provider error: {provider} - {message}")]
    IdentityProvider {
        /// The identity provider name.
        provider: String,
        /// Description of the error.
        message: String,
    },

}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Entropy` error.
    #[must_use]
    pub fn entropy(message: impl Into<String>) -> Self {
        Self::Entropy {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityProvider` error.
    #[must_use]
    pub fn identity_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidSession(_) | Self::InvalidRequest { .. })
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns `true` for failures that must stop the process at startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Entropy { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSession(_) => ErrorCategory::Session,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Serialization { .. } => ErrorCategory::Internal,
            Self::Entropy { .. } => ErrorCategory::Configuration,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::IdentityProvider { .. } => ErrorCategory::Federation,
        }
    }

    /// Returns the OAuth 2.0 style error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSession(_) => "unauthorized",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::IdentityProvider { .. } => "temporarily_unavailable",
            Self::Serialization { .. } | Self::Entropy { .. } | Self::Configuration { .. } => {
                "server_error"
            }
        }
    }
}

/// Categories of authentication errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Session cookie verification.
    Session,
    /// Request validation errors.
    Validation,
    /// Configuration and startup errors.
    Configuration,
    /// Identity provider errors.
    Federation,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Validation => write!(f, "validation"),
            Self::Configuration => write!(f, "configuration"),
            Self::Federation => write!(f, "federation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_session_converts() {
        let err: AuthError = InvalidSession::Expired.into();
        assert!(matches!(err, AuthError::InvalidSession(InvalidSession::Expired)));
        assert_eq!(err.to_string(), "Invalid session: session expired");
        assert_eq!(err.category(), ErrorCategory::Session);
    }

    #[test]
    fn test_client_vs_server_errors() {
        assert!(AuthError::invalid_request("missing code").is_client_error());
        assert!(AuthError::from(InvalidSession::SignatureMismatch).is_client_error());
        assert!(AuthError::identity_provider("google", "down").is_server_error());
        assert!(AuthError::serialization("boom").is_server_error());
        assert_eq!(
            AuthError::serialization("boom").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(AuthError::configuration("no key").is_fatal());
        assert!(AuthError::entropy("rng failed").is_fatal());
        assert!(!AuthError::invalid_request("bad").is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = AuthError::identity_provider("google", "token exchange failed");
        assert_eq!(
            err.to_string(),
            "Identity provider error: google - token exchange failed"
        );
        assert_eq!(err.error_code(), "temporarily_unavailable");
    }

    #[test]
    fn test_invalid_session_names() {
        assert_eq!(InvalidSession::MissingCookie.as_str(), "missing_cookie");
        assert_eq!(InvalidSession::SignatureMismatch.as_str(), "signature_mismatch");
        assert!(!InvalidSession::MissingCookie.is_rejected_token());
        assert!(InvalidSession::Expired.is_rejected_token());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Federation.to_string(), "federation");
        assert_eq!(ErrorCategory::Session.to_string(), "session");
    }
}
