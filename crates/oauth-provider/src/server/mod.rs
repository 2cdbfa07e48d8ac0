//! Authorization and resource server.
//!
//! Runs the OAuth2 authorization code endpoints and the protected user-info
//! endpoint on one axum listener, with a background task that evicts expired
//! authorization sessions.

pub mod oauth;
pub mod resource;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{ClientRegistry, UserDirectory};
use transport::HttpState;

/// OAuth2 provider server.
pub struct AuthServer {
    state: Arc<HttpState>,
}

impl AuthServer {
    /// Create a new server.
    #[must_use]
    pub fn new(config: Config, registry: ClientRegistry, directory: UserDirectory) -> Self {
        Self { state: Arc::new(HttpState::new(config, registry, directory)) }
    }

    /// Shared handler state.
    #[must_use]
    pub fn state(&self) -> Arc<HttpState> {
        Arc::clone(&self.state)
    }

    /// Build the router without binding a socket.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        transport::create_router(self.state())
    }

    /// Run the server in HTTP mode until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error on bind or server failure.
    pub async fn run_http(self) -> anyhow::Result<()> {
        let config = &self.state.config;
        if config.uses_dev_secret() {
            tracing::warn!("Signing tokens with the built-in development secret");
        }

        let sweep = Arc::clone(&self.state.sessions).start_cleanup_task(config.sweep_interval);

        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        tracing::info!(
            applications = self.state.registry.len(),
            users = self.state.directory.len(),
            "HTTP server listening on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let served = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await;

        sweep.abort();
        served?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for AuthServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServer").field("state", &self.state).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
