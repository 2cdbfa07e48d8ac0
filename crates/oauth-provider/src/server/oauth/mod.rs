//! OAuth 2.0 authorization server.
//!
//! Runs the authorization code flow for preregistered client applications:
//! the session store carries each login through its steps, and the token
//! issuer mints and verifies the HS256 access tokens handed out at the end.
//!
//! ## Supported Standards
//! - RFC 6749: Authorization Code Grant (`client_secret_post` and `client_secret_basic`)
//! - RFC 6750: Bearer Token Usage
//! - RFC 8414: OAuth Authorization Server Metadata (subset)

pub mod credentials;
pub mod handlers;
pub mod pages;
pub mod store;
pub mod token;
mod types;

pub use store::SessionStore;
pub use token::{AccessClaims, TokenIssuer, claims_to_user};
pub use types::{AccessTokenResponse, AuthorizationSession, FlowStage};
