//! Authorization session and token exchange types.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Where an authorization attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    /// Created by `/authorize`, waiting for the user to log in.
    LoginPending,
    /// User authenticated, waiting for consent.
    Authenticated,
    /// Consent given, code handed to the client.
    CodeIssued,
    /// Code exchanged for an access token.
    Exchanged,
}

/// One in-flight (or recently completed) authorization, keyed by `state`.
#[derive(Debug, Clone)]
pub struct AuthorizationSession {
    pub state: String,
    /// Internal id of the bound application.
    pub app_id: String,
    pub scope: String,
    pub code: Option<String>,
    /// Authenticated user, set by the login step.
    pub email: Option<String>,
    pub exchanged: bool,
    pub created_at: Instant,
}

impl AuthorizationSession {
    pub(crate) fn new(state: String, app_id: String, scope: String) -> Self {
        Self {
            state,
            app_id,
            scope,
            code: None,
            email: None,
            exchanged: false,
            created_at: Instant::now(),
        }
    }

    /// Check if the session is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }

    /// Current flow stage derived from the session fields.
    #[must_use]
    pub fn stage(&self) -> FlowStage {
        if self.exchanged {
            FlowStage::Exchanged
        } else if self.code.is_some() {
            FlowStage::CodeIssued
        } else if self.email.is_some() {
            FlowStage::Authenticated
        } else {
            FlowStage::LoginPending
        }
    }
}

/// Body of a successful token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl AccessTokenResponse {
    #[must_use]
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self { access_token, token_type: "bearer".to_string(), expires_in }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progression() {
        let mut session = AuthorizationSession::new("st".into(), "app".into(), String::new());
        assert_eq!(session.stage(), FlowStage::LoginPending);

        session.email = Some("a@b.c".into());
        assert_eq!(session.stage(), FlowStage::Authenticated);

        session.code = Some("code".into());
        assert_eq!(session.stage(), FlowStage::CodeIssued);

        session.exchanged = true;
        assert_eq!(session.stage(), FlowStage::Exchanged);
    }

    #[test]
    fn test_expiry_boundary() {
        let session = AuthorizationSession::new("st".into(), "app".into(), String::new());
        let ttl = Duration::from_secs(600);

        assert!(!session.is_expired_at(session.created_at + ttl, ttl));
        assert!(session.is_expired_at(session.created_at + ttl + Duration::from_secs(1), ttl));
    }
}
