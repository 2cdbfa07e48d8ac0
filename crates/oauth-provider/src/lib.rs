//! OAuth2 Provider
//!
//! A minimal OAuth2 authorization server (authorization code grant) paired with
//! a resource server that exposes the authenticated user's profile.
//!
//! # Features
//!
//! - **Authorization code flow**: authorize, login, consent, and token exchange
//! - **Signed access tokens**: HS256 JWTs carrying the user's name, email and roles
//! - **User-info resource**: bearer-protected profile endpoint
//! - **Relying-party client**: [`ProviderClient`] for applications consuming the provider
//!
//! # Example
//!
//! ```no_run
//! use oauth_provider::{AuthServer, config::Config, models::load_fixtures};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let (registry, directory) = load_fixtures(config.seed_file.as_deref())?;
//!
//!     AuthServer::new(config, registry, directory).run_http().await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;

pub use client::ProviderClient;
pub use config::Config;
pub use error::{ClientError, OAuthError};
pub use server::AuthServer;
