//! # pulpu-auth
//!
//! Authentication for the Pulpu web server.
//!
//! This crate provides:
//! - Stateless, HMAC-SHA256 signed session tokens carried in a cookie
//! - An axum gate that admits requests with a valid session and redirects
//!   everything else to the login flow (and its inverse for login pages)
//! - A Google OAuth 2.0 client that turns a completed login into an
//!   [`Identity`]
//!
//! ## Overview
//!
//! The server keeps no session store. After a successful login the
//! [`Identity`] and its expiry are serialized, signed with the process-wide
//! [`SecretKey`] and handed to the browser. Every later request is classified
//! independently by verifying that cookie.
//!
//! ## Modules
//!
//! - [`config`] - Session and identity provider configuration
//! - [`session`] - Session codec (issue/verify) and the cookie gate
//! - [`middleware`] - Axum middleware and extractors built on the gate
//! - [`provider`] - Google OAuth 2.0 client
//! - [`http`] - Login, callback and logout handlers

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod middleware;
pub mod provider;
pub mod session;

pub use config::{AuthConfig, ConfigError, GoogleConfig, RoutesConfig, SessionConfig};
pub use error::{AuthError, ErrorCategory, InvalidSession};
pub use http::{LoginState, auth_routes};
pub use identity::{Identity, Provider};
pub use middleware::{
    AntiGate, CurrentSession, OptionalSession, redirect_if_authenticated, require_session,
};
pub use provider::GoogleProvider;
pub use session::{
    SecretKey, Session, SessionCodec, SessionGate, SessionSettings, SessionToken,
    generate_secret_key, issue, verify,
};
