//! Logout handler.

use axum::extract::State;
use axum::response::Redirect;
use axum_extra::extract::CookieJar;

use super::LoginState;

/// `GET /logout/google` - ends the session.
///
/// Sessions are stateless, so logging out only clears the cookies; a copied
/// token stays valid until it expires.
pub async fn logout(State(state): State<LoginState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if jar.get(state.gate.cookie_name()).is_some() {
        tracing::info!("Clearing session cookie");
    }

    let jar = state.gate.clear_session(jar);
    let jar = state.forget_state(jar);
    (jar, Redirect::temporary(&state.routes.after_logout))
}
