//! Protected resource endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};

use super::oauth::{claims_to_user, credentials};
use super::transport::HttpState;
use crate::error::OAuthError;
use crate::models::UserInfo;

/// `GET /resources/v2/userinfo`
///
/// Requires `Authorization: Bearer <token>`. Any verification failure yields
/// the same 401; the specific reason is only logged.
pub async fn handle_userinfo(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> Result<Json<UserInfo>, OAuthError> {
    let token = credentials::bearer_from_headers(&headers)
        .ok_or_else(|| OAuthError::invalid_token("Missing access token"))?;

    let claims = state.tokens.verify(token)?;

    let user = claims_to_user(&claims)
        .map_err(|e| OAuthError::internal(format!("Error while fetching the user: {e}")))?;

    tracing::debug!(email = %user.email, "Served user info");
    Ok(Json(user))
}
