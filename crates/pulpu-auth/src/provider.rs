//! Google OAuth 2.0 client.
//!
//! Implements the two halves of the authorization code flow that the login
//! routes need:
//!
//! 1. **Begin** - build the authorization URL the browser is sent to
//! 2. **Complete** - exchange the returned code for an access token and load
//!    the user's profile from the userinfo endpoint
//!
//! The access token is used once to fetch the profile and then dropped; it
//! never ends up in the session.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::GoogleConfig;
use crate::error::AuthError;
use crate::identity::{Identity, Provider};

/// Google OAuth 2.0 / OpenID Connect client.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    callback_url: Url,
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

/// Token endpoint success response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Token endpoint error response (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Profile returned by Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Stable Google account identifier.
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    /// Any other claims (`email_verified`, `hd`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl From<GoogleUserInfo> for Identity {
    fn from(info: GoogleUserInfo) -> Self {
        let mut identity = Identity::new(Provider::Google, info.sub);
        identity.name = info.name;
        identity.email = info.email;
        identity.first_name = info.given_name;
        identity.last_name = info.family_name;
        identity.avatar_url = info.picture;
        identity.location = info.locale;
        identity.attributes = info.extra;
        identity
    }
}

impl GoogleProvider {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if a URL does not parse or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &GoogleConfig) -> Result<Self, AuthError> {
        let http_client = build_http_client(config.request_timeout)?;
        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: parse_url("callback_url", &config.callback_url)?,
            authorization_endpoint: parse_url(
                "authorization_endpoint",
                &config.authorization_endpoint,
            )?,
            token_endpoint: parse_url("token_endpoint", &config.token_endpoint)?,
            userinfo_endpoint: parse_url("userinfo_endpoint", &config.userinfo_endpoint)?,
            scopes: config.scopes.clone(),
            http_client,
        })
    }

    /// Which provider this client talks to.
    #[must_use]
    pub fn provider(&self) -> Provider {
        Provider::Google
    }

    /// Redirect URI registered with Google.
    #[must_use]
    pub fn callback_url(&self) -> &Url {
        &self.callback_url
    }

    /// Path component of the redirect URI, where the callback route is mounted.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        self.callback_url.path()
    }

    /// Builds the URL that starts the login at Google.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.callback_url.as_str())
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url
    }

    /// Completes the login for an authorization code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IdentityProvider` if the code exchange or the
    /// profile request fails.
    pub async fn complete(&self, code: &str) -> Result<Identity, AuthError> {
        let token = self.exchange_code(code).await?;
        let info = self.fetch_userinfo(&token.access_token).await?;

        tracing::info!(provider = %Provider::Google, user_id = %info.sub, "Login completed");

        Ok(info.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        tracing::debug!(endpoint = %self.token_endpoint, "Exchanging authorization code");

        let response = self
            .http_client
            .post(self.token_endpoint.as_str())
            .form(&params)
            .send()
            .await
            .map_err(|e| provider_error(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                return Err(provider_error(format!(
                    "token exchange rejected: {} {}",
                    oauth_error.error,
                    oauth_error.error_description.unwrap_or_default()
                )));
            }

            return Err(provider_error(format!("token exchange failed: HTTP {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| provider_error(format!("failed to parse token response: {e}")))?;

        if let Some(token_type) = &token.token_type
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(provider_error(format!("unsupported token type '{token_type}'")));
        }

        Ok(token)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, AuthError> {
        let response = self
            .http_client
            .get(self.userinfo_endpoint.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| provider_error(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(provider_error(format!(
                "userinfo request failed: HTTP {}",
                response.status()
            )));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| provider_error(format!("failed to parse userinfo response: {e}")))?;

        if info.sub.is_empty() {
            return Err(provider_error("userinfo response has an empty subject"));
        }

        Ok(info)
    }
}

fn provider_error(message: impl Into<String>) -> AuthError {
    let err = AuthError::identity_provider(Provider::Google.as_str(), message);
    tracing::warn!(error = %err, "Google login failed");
    err
}

fn parse_url(field: &str, value: &str) -> Result<Url, AuthError> {
    Url::parse(value)
        .map_err(|e| AuthError::configuration(format!("auth.google.{field} '{value}': {e}")))
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AuthError::configuration(format!("failed to build HTTP client: {e}")))
}
