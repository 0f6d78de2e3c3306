use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::middleware;
use axum::routing::get;
use pulpu_auth::config::RoutesConfig;
use pulpu_auth::{
    AuthError, GoogleProvider, LoginState, SessionGate, auth_routes, require_session,
};
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, handlers};

/// State shared by the page handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: SessionGate,
    pub routes: Arc<RoutesConfig>,
}

impl FromRef<AppState> for SessionGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

/// Path of the landing page.
pub const LANDING_PATH: &str = "/";

/// Path of the health check.
pub const HEALTH_PATH: &str = "/healthz";

pub struct PulpuServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application router from a validated configuration.
///
/// # Errors
///
/// Returns `AuthError::Configuration` if the session or Google settings
/// cannot be turned into runtime state.
pub fn build_app(cfg: &AppConfig) -> Result<Router, AuthError> {
    let settings = cfg
        .auth
        .session_settings()
        .map_err(|e| AuthError::configuration(e.to_string()))?;
    let gate = SessionGate::new(settings)?;
    let provider = Arc::new(GoogleProvider::from_config(&cfg.auth.google)?);
    let routes = cfg.auth.routes.clone();

    let state = AppState {
        gate: gate.clone(),
        routes: Arc::new(routes.clone()),
    };

    let protected = Router::new()
        .route(&routes.after_login, get(handlers::protected))
        .route_layer(middleware::from_fn_with_state(gate.clone(), require_session));

    let app = Router::new()
        .route(LANDING_PATH, get(handlers::landing))
        .route(HEALTH_PATH, get(handlers::healthz))
        .merge(protected)
        .with_state(state)
        .merge(auth_routes(LoginState::new(gate, provider, routes)))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http.request",
                    http.method = %req.method(),
                    http.target = %req.uri().path(),
                )
            }),
        );

    Ok(app)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<PulpuServer, AuthError> {
        let app = build_app(&self.config)?;

        Ok(PulpuServer {
            addr: self.addr,
            app,
        })
    }
}

impl PulpuServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
