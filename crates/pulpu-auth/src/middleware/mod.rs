//! HTTP middleware for session authentication.
//!
//! This module provides Axum middleware and extractors for:
//!
//! - Admitting only requests that carry a valid session ([`require_session`])
//! - Bouncing already-authenticated users away from login pages
//!   ([`redirect_if_authenticated`])
//! - Reading the verified session in handlers ([`CurrentSession`],
//!   [`OptionalSession`])
//! - JSON error responses for [`AuthError`](crate::AuthError)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use pulpu_auth::{CurrentSession, SessionGate, require_session};
//!
//! async fn protected(CurrentSession(session): CurrentSession) -> String {
//!     format!("Hello, {}!", session.identity.display_name())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected))
//!     .route_layer(middleware::from_fn_with_state(gate.clone(), require_session));
//! ```

pub mod error;
pub mod extractors;
pub mod gate;

pub use error::error_json;
pub use extractors::{CurrentSession, OptionalSession};
pub use gate::{AntiGate, redirect_if_authenticated, require_session};
