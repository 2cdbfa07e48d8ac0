//! Relying-party client for the provider.
//!
//! What a registered application's backend does once the user comes back to its
//! redirect URI: trade the code for an access token, then call the user-info
//! endpoint with it.
//!
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff for user-info calls
//! - Code exchange is sent once (codes are single-use)

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use url::Url;

use crate::config::{defaults, paths};
use crate::error::{ClientError, ClientResult};
use crate::models::UserInfo;
use crate::server::oauth::AccessTokenResponse;

/// Client for one registered application.
#[derive(Clone)]
pub struct ProviderClient {
    /// Plain client for the token exchange.
    http: Client,

    /// Client with retry middleware for idempotent calls.
    client: ClientWithMiddleware,

    /// Provider base URL.
    base_url: Url,

    client_id: String,
    client_secret: String,
}

impl ProviderClient {
    /// Create a client for `client_id` against the provider at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or HTTP client initialization fails.
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Self::with_retries(base_url, client_id, client_secret, 3)
    }

    /// Create a client with an explicit retry budget for user-info calls.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or HTTP client initialization fails.
    pub fn with_retries(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        max_retries: u32,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(defaults::REQUEST_TIMEOUT)
            .connect_timeout(defaults::CONNECT_TIMEOUT)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
            .build_with_max_retries(max_retries);

        let client = ClientBuilder::new(http.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            client,
            base_url: Url::parse(base_url)?,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// The client id this client authenticates as.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// URL that starts the authorization flow for this application.
    ///
    /// # Errors
    ///
    /// Returns error if the provider base URL cannot be joined with the path.
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        scope: &str,
        state: Option<&str>,
    ) -> ClientResult<Url> {
        let mut url = self.base_url.join(paths::AUTHORIZE)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", scope);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] if the provider refuses the code or
    /// client credentials, or another error on transport or parse failure.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> ClientResult<AccessTokenResponse> {
        let url = self.base_url.join(paths::TOKEN)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .finish();

        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch the user-info projection for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] if the token is rejected.
    pub async fn user_info(&self, access_token: &str) -> ClientResult<UserInfo> {
        let url = self.base_url.join(paths::USERINFO)?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Exchange a code and immediately fetch the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns the first error from either step.
    pub async fn exchange_and_fetch(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> ClientResult<(AccessTokenResponse, UserInfo)> {
        let token = self.exchange_code(code, redirect_uri).await?;
        let user = self.user_info(&token.access_token).await?;
        tracing::info!(client_id = %self.client_id, email = %user.email, "Fetched user info");
        Ok((token, user))
    }

    /// Handle provider response status codes.
    async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        match status.as_u16() {
            400 => Err(ClientError::bad_request(text)),
            401 => Err(ClientError::unauthorized(text)),
            _ => Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text }),
        }
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .finish()
    }
}
