//! Page handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use pulpu_auth::config::RoutesConfig;
use pulpu_auth::{CurrentSession, Identity, OptionalSession, Session};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Landing page: a login link, or links onward when already signed in.
pub async fn landing(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
) -> Html<String> {
    Html(render_landing(&state.routes, session.as_ref()))
}

/// The gated page. Only reachable behind `require_session`.
pub async fn protected(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Html<String> {
    Html(render_protected(
        &state.routes,
        &session,
        OffsetDateTime::now_utc(),
    ))
}

pub fn render_landing(routes: &RoutesConfig, session: Option<&Session>) -> String {
    let mut content = String::with_capacity(512);
    content.push_str("<h1>Pulpu</h1>\n");

    match session {
        Some(session) => {
            content.push_str("<p>Signed in as ");
            content.push_str(&html_escape(session.identity.display_name()));
            content.push_str(".</p>\n");
            push_link(&mut content, &routes.after_login, "Continue");
            push_link(&mut content, &routes.logout, "Log out");
        }
        None => {
            push_link(&mut content, &routes.login, "Log in with Google");
        }
    }

    page("Pulpu", &content)
}

pub fn render_protected(routes: &RoutesConfig, session: &Session, now: OffsetDateTime) -> String {
    let identity = &session.identity;
    let mut content = String::with_capacity(1024);

    content.push_str("<h1>Welcome, ");
    content.push_str(&html_escape(identity.display_name()));
    content.push_str("</h1>\n");

    if let Some(avatar) = &identity.avatar_url {
        content.push_str("<img src=\"");
        content.push_str(&html_escape(avatar));
        content.push_str("\" alt=\"avatar\" width=\"64\" height=\"64\">\n");
    }

    content.push_str("<dl>\n");
    for (label, value) in identity_fields(identity) {
        content.push_str("<dt>");
        content.push_str(label);
        content.push_str("</dt><dd>");
        content.push_str(&html_escape(&value));
        content.push_str("</dd>\n");
    }

    let expires = session
        .expires_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| session.expires_at.to_string());
    content.push_str("<dt>Session expires</dt><dd>");
    content.push_str(&html_escape(&expires));
    content.push_str(" (in ");
    content.push_str(&session.remaining(now).whole_minutes().to_string());
    content.push_str(" min)</dd>\n</dl>\n");

    push_link(&mut content, &routes.logout, "Log out");

    page("Protected", &content)
}

fn identity_fields(identity: &Identity) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Provider", identity.provider.to_string()),
        ("User ID", identity.user_id.clone()),
    ];
    let optional = [
        ("Name", &identity.name),
        ("Email", &identity.email),
        ("First name", &identity.first_name),
        ("Last name", &identity.last_name),
        ("Nickname", &identity.nick_name),
        ("Location", &identity.location),
        ("Description", &identity.description),
    ];
    fields.extend(
        optional
            .into_iter()
            .filter_map(|(label, value)| value.clone().map(|v| (label, v))),
    );
    fields
}

fn push_link(content: &mut String, href: &str, text: &str) {
    content.push_str("<p><a href=\"");
    content.push_str(&html_escape(href));
    content.push_str("\">");
    content.push_str(text);
    content.push_str("</a></p>\n");
}

fn page(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        html_escape(title),
        content
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
