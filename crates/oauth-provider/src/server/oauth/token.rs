//! Signed access tokens.
//!
//! Tokens are HS256 JWTs carrying the user's name, email and roles plus
//! issued-at and expiry timestamps. They are stateless: there is no revocation
//! list, so a token stays usable by whoever holds it until it expires.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};
use crate::models::{User, UserInfo};

/// Claims embedded in an access token.
///
/// Identity claims are optional at decode time so that a token missing one is
/// reported as [`TokenError::MissingClaim`] by [`claims_to_user`] rather than as
/// a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<String>,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Mints and verifies access tokens with a server-held secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Create an issuer using HS256 and a shared secret.
    #[must_use]
    pub fn new_hs256(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// Token lifetime in seconds, as reported in `expires_in`.
    #[must_use]
    pub const fn lifetime_secs(&self) -> u64 {
        self.lifetime.as_secs()
    }

    /// Issue a token for `user`, valid from now for the configured lifetime.
    pub fn issue(&self, user: &User) -> TokenResult<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> TokenResult<String> {
        let iat = now.timestamp();
        let claims = AccessClaims {
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            roles: Some(user.roles.clone()),
            iat,
            exp: iat + self.lifetime.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify structure, signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> TokenResult<AccessClaims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// A token is accepted only while `now` is strictly before its expiry.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now`, without leeway.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("lifetime", &self.lifetime).finish()
    }
}

/// Project verified claims back into the user-info view.
pub fn claims_to_user(claims: &AccessClaims) -> TokenResult<UserInfo> {
    let name = claims.name.clone().ok_or(TokenError::MissingClaim("name"))?;
    let email = claims.email.clone().ok_or(TokenError::MissingClaim("email"))?;
    let roles = claims.roles.clone().ok_or(TokenError::MissingClaim("roles"))?;
    Ok(UserInfo { name, email, roles })
}
