//! Session cookie handling.
//!
//! [`SessionGate`] reads the session cookie from a request, verifies it with
//! the [`SessionCodec`], and writes or clears it on responses. The axum
//! middleware in [`crate::middleware`] is a thin wrapper around it.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use super::SessionSettings;
use super::codec::{Session, SessionCodec};
use crate::error::{AuthError, InvalidSession};
use crate::identity::Identity;

/// Cookie-backed session gate.
///
/// Cheap to clone; build it once at startup and share it through router
/// state.
#[derive(Debug, Clone)]
pub struct SessionGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    codec: SessionCodec,
    cookie_name: String,
    login_path: String,
}

impl SessionGate {
    /// Creates a gate from runtime settings.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the session duration is not
    /// positive.
    pub fn new(settings: SessionSettings) -> Result<Self, AuthError> {
        let codec = SessionCodec::new(settings.key, settings.duration)?;
        Ok(Self {
            inner: Arc::new(GateInner {
                codec,
                cookie_name: settings.cookie_name,
                login_path: settings.login_path,
            }),
        })
    }

    /// The codec used to issue and verify tokens.
    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.inner.codec
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie_name
    }

    /// Where unauthenticated requests are redirected.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.inner.login_path
    }

    /// Reads the session token from the request cookies.
    ///
    /// A missing or empty cookie is the unauthenticated state, not an error.
    #[must_use]
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        jar.get(self.cookie_name())
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Extracts and verifies the session carried by a request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSession::MissingCookie` when no token is present,
    /// otherwise the verification failure.
    pub fn require_session(
        &self,
        headers: &HeaderMap,
        now: OffsetDateTime,
    ) -> Result<Session, InvalidSession> {
        let token = self
            .extract_token(headers)
            .ok_or(InvalidSession::MissingCookie)?;
        self.inner.codec.verify(&token, now)
    }

    /// Issues a session for `identity` and adds its cookie to `jar`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be signed.
    pub fn establish_session(
        &self,
        jar: CookieJar,
        identity: Identity,
        now: OffsetDateTime,
    ) -> Result<(CookieJar, Session), AuthError> {
        let (session, token) = self.inner.codec.seal(identity, now)?;
        let cookie = self.session_cookie(token.into_string(), session.expires_at);
        Ok((jar.add(cookie), session))
    }

    /// Overwrites the session cookie with an empty, already expired one.
    #[must_use]
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.session_cookie(String::new(), OffsetDateTime::UNIX_EPOCH))
    }

    fn session_cookie(&self, value: String, expires: OffsetDateTime) -> Cookie<'static> {
        Cookie::build((self.inner.cookie_name.clone(), value))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Lax)
            .path("/")
            .expires(expires)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Provider;
    use crate::session::SecretKey;
    use axum::http::HeaderValue;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;
    use time::Duration;
    use time::macros::datetime;

    const T: OffsetDateTime = datetime!(2025-03-01 12:00:00 UTC);

    fn gate() -> SessionGate {
        let settings = SessionSettings::new(SecretKey::new([0u8; 32]).unwrap())
            .with_duration(Duration::hours(1));
        SessionGate::new(settings).unwrap()
    }

    fn identity() -> Identity {
        Identity::new(Provider::Google, "u1")
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    /// Collects the Set-Cookie headers a jar would write.
    fn set_cookies(jar: CookieJar) -> Vec<Cookie<'static>> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| Cookie::parse(v.to_str().unwrap().to_string()).unwrap())
            .collect()
    }

    #[test]
    fn test_extract_token_absent() {
        assert_eq!(gate().extract_token(&HeaderMap::new()), None);
        assert_eq!(gate().extract_token(&cookie_headers("other=1")), None);
        assert_eq!(gate().extract_token(&cookie_headers("pulpu_session=")), None);
    }

    #[test]
    fn test_extract_token_among_other_cookies() {
        let headers = cookie_headers("a=1; pulpu_session=abc.def; b=2");
        assert_eq!(gate().extract_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_require_session_missing_cookie() {
        assert_eq!(
            gate().require_session(&HeaderMap::new(), T),
            Err(InvalidSession::MissingCookie)
        );
    }

    #[test]
    fn test_require_session_rejects_garbage() {
        let headers = cookie_headers("pulpu_session=garbage");
        assert_eq!(
            gate().require_session(&headers, T),
            Err(InvalidSession::MalformedFormat)
        );
    }

    #[test]
    fn test_establish_session_cookie_attributes() {
        let (jar, session) = gate()
            .establish_session(CookieJar::new(), identity(), T)
            .unwrap();
        assert_eq!(session.expires_at, T + Duration::hours(1));

        let cookies = set_cookies(jar);
        assert_eq!(cookies.len(), 1);
        let cookie = &cookies[0];
        assert_eq!(cookie.name(), "pulpu_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.expires_datetime(), Some(session.expires_at));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookies = set_cookies(gate().clear_session(CookieJar::new()));
        assert_eq!(cookies.len(), 1);
        let cookie = &cookies[0];
        assert_eq!(cookie.name(), "pulpu_session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_established_cookie_reads_back_until_expiry() {
        let gate = gate();
        let (jar, _) = gate.establish_session(CookieJar::new(), identity(), T).unwrap();
        let cookie = &set_cookies(jar)[0];
        let headers = cookie_headers(&format!("{}={}", cookie.name(), cookie.value()));

        let session = gate.require_session(&headers, T + Duration::seconds(1)).unwrap();
        assert_eq!(session.identity, identity());

        assert_eq!(
            gate.require_session(&headers, T + Duration::seconds(3601)),
            Err(InvalidSession::Expired)
        );
    }

    #[test]
    fn test_custom_cookie_name() {
        let settings = SessionSettings::new(SecretKey::new([0u8; 32]).unwrap())
            .with_cookie_name("sid")
            .with_login_path("/login");
        let gate = SessionGate::new(settings).unwrap();
        assert_eq!(gate.cookie_name(), "sid");
        assert_eq!(gate.login_path(), "/login");
        assert_eq!(
            gate.extract_token(&cookie_headers("sid=x.y")).as_deref(),
            Some("x.y")
        );
    }

    #[test]
    fn test_zero_duration_rejected() {
        let settings = SessionSettings::new(SecretKey::new([0u8; 32]).unwrap())
            .with_duration(Duration::ZERO);
        assert!(SessionGate::new(settings).is_err());
    }
}
