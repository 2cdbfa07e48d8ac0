//! HTTP transport.
//!
//! Wires the authorization server and resource endpoints into one axum router,
//! with permissive CORS and request tracing.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::Uri,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::oauth::{SessionStore, TokenIssuer, handlers};
use super::resource;
use crate::config::{Config, paths};
use crate::error::OAuthError;
use crate::models::{ClientRegistry, UserDirectory};

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub config: Config,
    pub registry: Arc<ClientRegistry>,
    pub directory: Arc<UserDirectory>,
    pub sessions: Arc<SessionStore>,
    pub tokens: Arc<TokenIssuer>,
}

impl HttpState {
    /// Build handler state from configuration and the preloaded registry and directory.
    #[must_use]
    pub fn new(config: Config, registry: ClientRegistry, directory: UserDirectory) -> Self {
        let registry = Arc::new(registry);
        let sessions = Arc::new(SessionStore::new(Arc::clone(&registry), config.session_ttl));
        let tokens = Arc::new(TokenIssuer::new_hs256(
            config.jwt_secret.as_bytes(),
            config.token_lifetime,
        ));

        Self { config, registry, directory: Arc::new(directory), sessions, tokens }
    }
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState")
            .field("config", &self.config)
            .field("applications", &self.registry.len())
            .field("users", &self.directory.len())
            .finish()
    }
}

/// Create the HTTP router for the authorization and resource servers.
pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route(paths::METADATA, get(handlers::handle_auth_server_metadata))
        // Authorization server
        .route(paths::AUTHORIZE, get(handlers::handle_authorize))
        .route(paths::LOGIN, get(handlers::handle_login))
        .route(paths::SUBMIT, post(handlers::handle_submit))
        .route(paths::CONSENT, post(handlers::handle_consent))
        .route(paths::TOKEN, post(handlers::handle_token))
        // Resource server
        .route(paths::USERINFO, get(resource::handle_userinfo))
        .fallback(handle_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "oauth-provider",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let session_count = state.sessions.session_count().await;
    Json(serde_json::json!({
        "status": "ready",
        "service": "oauth-provider",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": session_count,
        "applications": state.registry.len()
    }))
}

async fn handle_not_found(uri: Uri) -> OAuthError {
    OAuthError::not_found(format!("Route {}", uri.path()))
}
