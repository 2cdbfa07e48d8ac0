//! Error types for the OAuth2 provider.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Every request-level failure ends up as an [`OAuthError`], which knows how to turn
//! itself into an HTTP response.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::server::oauth::FlowStage;

/// Errors from the authorization session store.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The client id does not resolve to a registered application.
    #[error("Application not registered: {client_id}")]
    AppNotRegistered {
        /// The unknown client id
        client_id: String,
    },

    /// No live session for the given state or code.
    #[error("Authorization session not found")]
    SessionNotFound,

    /// A caller-supplied state collides with a live session.
    #[error("State is already in use by another authorization session")]
    StateInUse,

    /// The session has no authenticated user yet.
    #[error("Authorization session has no authenticated user")]
    NotAuthenticated,

    /// The authorization code was already exchanged for a token.
    #[error("Authorization code already exchanged")]
    AlreadyExchanged,

    /// The requested step is not allowed from the session's current stage.
    #[error("Step not allowed in stage {stage:?}")]
    FlowOutOfOrder {
        /// Stage the session was in
        stage: FlowStage,
    },
}

/// Errors from issuing or verifying access tokens.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the server secret.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Current time is at or past the embedded expiry.
    #[error("Token has expired")]
    Expired,

    /// Token is structurally broken (bad segments, base64, JSON, algorithm).
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// A required identity claim is absent.
    #[error("Missing {0} claim")]
    MissingClaim(&'static str),

    /// Encoding a new token failed.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Handler-boundary errors, each mapped to one HTTP status.
#[derive(thiserror::Error, Debug)]
pub enum OAuthError {
    /// Missing or malformed request parameters (400).
    #[error("{0}")]
    Validation(String),

    /// Bad user or client credentials, code or binding mismatch (401).
    #[error("{0}")]
    Authentication(String),

    /// Missing or rejected bearer token at a protected resource (401 with a
    /// `WWW-Authenticate: Bearer` challenge, RFC 6750 §3).
    #[error("{0}")]
    InvalidToken(String),

    /// Unknown application or session (404).
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Unexpected failure building a response (500).
    #[error("{0}")]
    Internal(String),
}

impl OAuthError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Create a bearer token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let challenge = matches!(self, Self::InvalidToken(_));
        let mut response = (status, self.to_string()).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Every token failure collapses to the same outward 401.
impl From<TokenError> for OAuthError {
    fn from(err: TokenError) -> Self {
        tracing::warn!(reason = %err, "Access token rejected");
        Self::invalid_token("Invalid access token")
    }
}

/// Errors from the relying-party HTTP client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// The provider rejected the credentials, code or token (401 response)
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Response body from the provider
        message: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Response body from the provider
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid provider base URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Returns true if the provider refused the exchange or token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Result type alias for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Result type alias for relying-party client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_error_status() {
        assert_eq!(OAuthError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(OAuthError::authentication("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(OAuthError::not_found("session").status(), StatusCode::NOT_FOUND);
        assert_eq!(OAuthError::internal("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_errors_are_uniform() {
        let reasons = [
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::Malformed("bad segment".into()),
        ];
        for reason in reasons {
            let err = OAuthError::from(reason);
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.to_string(), "Invalid access token");
        }
    }

    #[test]
    fn test_only_token_errors_carry_bearer_challenge() {
        let response = OAuthError::invalid_token("Missing access token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = OAuthError::authentication("Wrong credentials").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_flow_out_of_order_message() {
        let err = StoreError::FlowOutOfOrder { stage: FlowStage::CodeIssued };
        assert_eq!(err.to_string(), "Step not allowed in stage CodeIssued");
    }

    #[test]
    fn test_not_found_message() {
        let err = OAuthError::not_found("Application");
        assert_eq!(err.to_string(), "Application not found");
    }
}
