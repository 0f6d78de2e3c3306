//! Session token codec.
//!
//! A token is `base64url(payload) "." base64url(HMAC-SHA256(payload))`, where
//! the payload is the JSON encoding of a [`Session`]. Both segments use the
//! URL-safe alphabet without padding so the token is a valid cookie value
//! as-is.
//!
//! Verification is ordered so that attacker-controlled bytes are only parsed
//! as a `Session` after their signature has been checked:
//!
//! ```text
//! split on '.' ──► base64url decode ──► HMAC check ──► JSON decode ──► expiry
//!  MalformedFormat  MalformedEncoding   SignatureMismatch  MalformedPayload  Expired
//! ```

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Mac;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::key::SecretKey;
use crate::error::{AuthError, InvalidSession};
use crate::identity::Identity;

/// Separator between the payload and signature segments.
pub const TOKEN_SEPARATOR: char = '.';

/// An authenticated identity together with its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated principal.
    pub identity: Identity,

    /// Instant from which the session is no longer accepted.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Creates a session that expires `duration` after `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `duration` is not positive or
    /// the expiry is not representable.
    pub fn new(identity: Identity, now: OffsetDateTime, duration: Duration) -> Result<Self, AuthError> {
        if !duration.is_positive() {
            return Err(AuthError::configuration("session duration must be positive"));
        }
        let expires_at = now
            .checked_add(duration)
            .ok_or_else(|| AuthError::configuration("session expiry is out of range"))?;
        Ok(Self {
            identity,
            expires_at,
        })
    }

    /// Returns `true` if the session is no longer valid at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Time left until expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self, now: OffsetDateTime) -> Duration {
        (self.expires_at - now).max(Duration::ZERO)
    }
}

/// A signed, transport-safe session token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// The token as it is written to the cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the cookie value.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"..").finish()
    }
}

/// Signs an existing session.
///
/// # Errors
///
/// Returns `AuthError::Serialization` if the session cannot be encoded.
pub fn sign(session: &Session, key: &SecretKey) -> Result<SessionToken, AuthError> {
    let payload =
        serde_json::to_vec(session).map_err(|e| AuthError::serialization(e.to_string()))?;

    let mut mac = key.mac();
    mac.update(&payload);
    let signature = mac.finalize().into_bytes();

    Ok(SessionToken(format!(
        "{}{TOKEN_SEPARATOR}{}",
        URL_SAFE_NO_PAD.encode(&payload),
        URL_SAFE_NO_PAD.encode(signature)
    )))
}

/// Issues a token for `identity`, valid from `now` for `duration`.
///
/// # Errors
///
/// Returns `AuthError::Configuration` for a non-positive duration and
/// `AuthError::Serialization` if the identity cannot be encoded.
pub fn issue(
    identity: Identity,
    now: OffsetDateTime,
    duration: Duration,
    key: &SecretKey,
) -> Result<SessionToken, AuthError> {
    let session = Session::new(identity, now, duration)?;
    sign(&session, key)
}

/// Verifies a token and returns the session it carries.
///
/// # Errors
///
/// Returns the first [`InvalidSession`] reason encountered, in the order
/// described in the module documentation.
pub fn verify(token: &str, now: OffsetDateTime, key: &SecretKey) -> Result<Session, InvalidSession> {
    let mut segments = token.split(TOKEN_SEPARATOR);
    let (Some(payload_b64), Some(signature_b64), None) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(InvalidSession::MalformedFormat);
    };

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| InvalidSession::MalformedEncoding)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| InvalidSession::MalformedEncoding)?;

    let mut mac = key.mac();
    mac.update(&payload);
    mac.verify_slice(&signature)
        .map_err(|_| InvalidSession::SignatureMismatch)?;

    let session: Session =
        serde_json::from_slice(&payload).map_err(|_| InvalidSession::MalformedPayload)?;

    if session.is_expired_at(now) {
        return Err(InvalidSession::Expired);
    }

    Ok(session)
}

/// A key and session lifetime bundled for repeated use.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    key: SecretKey,
    duration: Duration,
}

impl SessionCodec {
    /// Creates a codec.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `duration` is not positive.
    pub fn new(key: SecretKey, duration: Duration) -> Result<Self, AuthError> {
        if !duration.is_positive() {
            return Err(AuthError::configuration("session duration must be positive"));
        }
        Ok(Self { key, duration })
    }

    /// The signing key.
    #[must_use]
    pub fn key(&self) -> &SecretKey {
        &self.key
    }

    /// Lifetime of issued sessions.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Issues a token for `identity` starting at `now`.
    ///
    /// # Errors
    ///
    /// See [`issue`].
    pub fn issue(&self, identity: Identity, now: OffsetDateTime) -> Result<SessionToken, AuthError> {
        issue(identity, now, self.duration, &self.key)
    }

    /// Creates and signs a session, returning both.
    ///
    /// # Errors
    ///
    /// See [`issue`].
    pub fn seal(
        &self,
        identity: Identity,
        now: OffsetDateTime,
    ) -> Result<(Session, SessionToken), AuthError> {
        let session = Session::new(identity, now, self.duration)?;
        let token = sign(&session, &self.key)?;
        Ok((session, token))
    }

    /// Verifies a token at `now`.
    ///
    /// # Errors
    ///
    /// See [`verify`].
    pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<Session, InvalidSession> {
        verify(token, now, &self.key)
    }
}
