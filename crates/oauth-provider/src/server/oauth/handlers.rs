//! OAuth 2.0 authorization code flow endpoint handlers.
//!
//! The flow runs `authorize -> login -> submit -> consent -> token`, with the
//! `state` value carrying the authorization session between steps.
//!
//! Implements:
//! - RFC 6749: OAuth 2.0 Authorization Code Grant
//! - RFC 8414: OAuth Authorization Server Metadata (subset)

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Query, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::credentials;
use super::pages;
use super::types::{AccessTokenResponse, FlowStage};
use crate::config::paths;
use crate::error::{OAuthError, StoreError};
use crate::server::transport::HttpState;

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
///
/// Describes the OAuth endpoints and capabilities.
pub async fn handle_auth_server_metadata(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let config = &state.config;
    Json(serde_json::json!({
        "issuer": config.base_url,
        "authorization_endpoint": config.endpoint(paths::AUTHORIZE),
        "token_endpoint": config.endpoint(paths::TOKEN),
        "userinfo_endpoint": config.endpoint(paths::USERINFO),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": ["client_secret_post", "client_secret_basic"]
    }))
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

/// `GET /oauth/v2/authorize`
///
/// Validates the client and its exact redirect URI, opens an authorization
/// session and sends the user to the login page. A missing `state` is generated.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, OAuthError> {
    if query.response_type.as_deref() != Some("code") {
        return Err(OAuthError::validation(
            "Only the Authorization Code flow is available: response_type must be 'code'",
        ));
    }

    let client_id = query.client_id.unwrap_or_default();
    let redirect_uri = query.redirect_uri.unwrap_or_default();
    let registered = state
        .registry
        .find_by_client_id(&client_id)
        .is_some_and(|app| app.redirect_uri == redirect_uri);
    if !registered {
        tracing::warn!(client_id = %client_id, "Rejected authorize request");
        return Err(OAuthError::validation("Invalid client ID or redirect URI"));
    }

    let oauth_state = non_blank(query.state).unwrap_or_else(super::SessionStore::generate_state);
    let scope = query.scope.unwrap_or_default();

    let session = state.sessions.create(&client_id, &scope, oauth_state).await.map_err(|e| match e {
        StoreError::StateInUse => OAuthError::validation("state is already in use"),
        other => OAuthError::internal(format!("Error while creating a new login session: {other}")),
    })?;

    tracing::info!(client_id = %client_id, state = %session.state, "Started authorization");

    let mut login_url = url::Url::parse(&state.config.endpoint(paths::LOGIN))
        .map_err(|e| OAuthError::internal(format!("Invalid login URL: {e}")))?;
    login_url.query_pairs_mut().append_pair("state", &session.state);

    Ok(found(login_url.as_str()))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub state: Option<String>,
}

/// `GET /oauth/v2/login`
pub async fn handle_login(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, OAuthError> {
    let oauth_state =
        non_blank(query.state).ok_or_else(|| OAuthError::validation("Missing state"))?;
    if state.sessions.find_by_state(&oauth_state).await.is_none() {
        return Err(OAuthError::validation("Session unknown"));
    }

    Ok(login_page(&oauth_state, StatusCode::OK, None))
}

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    pub state: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /oauth/v2/submit`
///
/// Authenticates the user, records them on the session and shows the consent page.
pub async fn handle_submit(
    State(state): State<Arc<HttpState>>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Result<Response, OAuthError> {
    let form = form_body(form)?;
    let oauth_state =
        non_blank(form.state).ok_or_else(|| OAuthError::validation("Missing state"))?;
    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let session = state
        .sessions
        .find_by_state(&oauth_state)
        .await
        .ok_or_else(|| OAuthError::authentication("Session unknown"))?;
    if !matches!(session.stage(), FlowStage::LoginPending | FlowStage::Authenticated) {
        return Err(login_completed(&oauth_state, session.stage()));
    }

    if state.directory.find_by_email_and_credential(&email, &password).is_none() {
        tracing::info!(email = %email, "Login failed");
        return Ok(login_page(&oauth_state, StatusCode::UNAUTHORIZED, Some("Wrong credentials")));
    }

    let session = state
        .sessions
        .attach_email(&oauth_state, &email)
        .await
        .map_err(|e| match e {
            StoreError::FlowOutOfOrder { stage } => login_completed(&oauth_state, stage),
            _ => OAuthError::authentication("Session unknown"),
        })?;

    let app = state
        .registry
        .find_by_id(&session.app_id)
        .ok_or_else(|| OAuthError::internal("App unknown"))?;

    tracing::info!(state = %oauth_state, email = %email, "User authenticated");

    Ok(Html(pages::render_consent_page(&oauth_state, &app.name)).into_response())
}

// ─── Consent ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConsentForm {
    pub state: Option<String>,
}

/// `POST /oauth/v2/consent`
///
/// Issues the authorization code and redirects to the application's registered
/// redirect URI. The target always comes from the registry.
pub async fn handle_consent(
    State(state): State<Arc<HttpState>>,
    form: Result<Form<ConsentForm>, FormRejection>,
) -> Result<Response, OAuthError> {
    let form = form_body(form)?;
    let oauth_state =
        non_blank(form.state).ok_or_else(|| OAuthError::validation("Missing state"))?;

    let (session, code) = state.sessions.attach_code(&oauth_state).await.map_err(|e| match e {
        StoreError::FlowOutOfOrder { stage } => {
            tracing::warn!(state = %oauth_state, ?stage, "Consent after token exchange");
            OAuthError::validation("Authorization already completed")
        }
        other => OAuthError::authentication(other.to_string()),
    })?;

    let app = state.registry.find_by_id(&session.app_id).ok_or_else(|| {
        OAuthError::internal(format!("App {} not found in the System", session.app_id))
    })?;

    let mut redirect = url::Url::parse(&app.redirect_uri)
        .map_err(|e| OAuthError::internal(format!("Invalid registered redirect URI: {e}")))?;
    redirect.query_pairs_mut().append_pair("code", &code).append_pair("state", &oauth_state);

    tracing::info!(client_id = %app.client_id, state = %oauth_state, "Issued authorization code");

    Ok(found(redirect.as_str()))
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// `POST /oauth/v2/token`
///
/// Exchanges an authorization code for an access token. Client credentials come
/// from the form body, or from a `Basic` header when both body fields are blank.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Response, OAuthError> {
    let form = form_body(form)?;
    let mut client_id = non_blank(form.client_id);
    let mut client_secret = non_blank(form.client_secret);
    if client_id.is_none() && client_secret.is_none() {
        if let Some(creds) = credentials::basic_from_headers(&headers) {
            client_id = non_blank(Some(creds.client_id));
            client_secret = non_blank(Some(creds.client_secret));
        }
    }

    let (Some(grant_type), Some(code), Some(redirect_uri), Some(client_id), Some(client_secret)) = (
        non_blank(form.grant_type),
        non_blank(form.code),
        non_blank(form.redirect_uri),
        client_id,
        client_secret,
    ) else {
        return Err(OAuthError::validation(
            "missing one or more of the following params: code, redirect_uri, client_id, client_secret, grant_type",
        ));
    };

    if grant_type != "authorization_code" {
        return Err(OAuthError::validation(
            "Only the Authorization Code flow is available: grant_type must be 'authorization_code'",
        ));
    }

    let session = state
        .sessions
        .redeem_code(&client_id, &client_secret, &redirect_uri, &code)
        .await
        .map_err(|e| {
            tracing::warn!(client_id = %client_id, reason = %e, "Token exchange refused");
            match e {
                StoreError::NotAuthenticated => OAuthError::authentication(
                    "failed to find the email associated with the authorization session",
                ),
                StoreError::AlreadyExchanged => {
                    OAuthError::authentication("authorization code already used")
                }
                _ => OAuthError::authentication(
                    "failed to exchange authorization code with access token",
                ),
            }
        })?;

    // redeem_code only succeeds with an email attached
    let email = session.email.unwrap_or_default();
    let user = state
        .directory
        .find_by_email(&email)
        .ok_or_else(|| OAuthError::internal("User not found in the System"))?;

    let access_token = state
        .tokens
        .issue(user)
        .map_err(|e| OAuthError::internal(format!("Error while issuing the access_token: {e}")))?;

    tracing::info!(client_id = %client_id, state = %session.state, "Issued access token");

    token_success(AccessTokenResponse::bearer(access_token, state.tokens.lifetime_secs()))
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
///
/// The token is also echoed in an `access_token` response header.
fn token_success(body: AccessTokenResponse) -> Result<Response, OAuthError> {
    let echoed = HeaderValue::from_str(&body.access_token)
        .map_err(|e| OAuthError::internal(format!("Invalid access_token header: {e}")))?;

    let mut response = Json(body).into_response();
    let headers = response.headers_mut();
    headers.insert("access_token", echoed);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(response)
}

fn login_page(oauth_state: &str, status: StatusCode, error: Option<&str>) -> Response {
    (
        status,
        [(
            header::HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        )],
        Html(pages::render_login_page(oauth_state, error)),
    )
        .into_response()
}

/// Unwrap a form body, turning axum's rejection (wrong content type, bad
/// encoding) into a 400.
fn form_body<T>(form: Result<Form<T>, FormRejection>) -> Result<T, OAuthError> {
    form.map(|Form(body)| body).map_err(|rejection| {
        OAuthError::validation(format!("Invalid form body: {}", rejection.body_text()))
    })
}

fn login_completed(oauth_state: &str, stage: FlowStage) -> OAuthError {
    tracing::warn!(state = %oauth_state, ?stage, "Login attempted after code issuance");
    OAuthError::validation("Login already completed for this authorization")
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
