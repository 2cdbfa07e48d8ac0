//! Configuration for the OAuth2 provider.

use std::path::PathBuf;
use std::time::Duration;

/// Protocol constants and defaults.
pub mod defaults {
    use std::time::Duration;

    /// Default listening port.
    pub const PORT: u16 = 8080;

    /// Public base URL the server announces in redirects and metadata.
    pub const BASE_URL: &str = "http://localhost:8080";

    /// Development signing secret. Never use outside local demos.
    pub const DEV_JWT_SECRET: &str = "my_secret_key";

    /// Authorization session lifetime (10 minutes).
    pub const SESSION_TTL: Duration = Duration::from_secs(600);

    /// Interval between expired-session sweeps (1 minute).
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

    /// Access token lifetime (60 minutes).
    pub const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

    /// Relying-party client request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Relying-party client connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Endpoint paths served by the provider.
pub mod paths {
    pub const AUTHORIZE: &str = "/oauth/v2/authorize";
    pub const LOGIN: &str = "/oauth/v2/login";
    pub const SUBMIT: &str = "/oauth/v2/submit";
    pub const CONSENT: &str = "/oauth/v2/consent";
    pub const TOKEN: &str = "/oauth/v2/token";
    pub const USERINFO: &str = "/resources/v2/userinfo";
    pub const METADATA: &str = "/.well-known/oauth-authorization-server";
}

/// Server configuration.
#[derive(Clone)]
pub struct Config {
    /// Listening port.
    pub port: u16,

    /// Public base URL (no trailing slash).
    pub base_url: String,

    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,

    /// Authorization session lifetime.
    pub session_ttl: Duration,

    /// Interval between expired-session sweeps.
    pub sweep_interval: Duration,

    /// Access token lifetime.
    pub token_lifetime: Duration,

    /// Optional JSON seed file for applications and users.
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Create a configuration with the given port, base URL and signing secret.
    ///
    /// Lifetimes take their protocol defaults.
    #[must_use]
    pub fn new(port: u16, base_url: Option<String>, jwt_secret: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| defaults::BASE_URL.to_string());
        Self {
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            jwt_secret: jwt_secret.unwrap_or_else(|| defaults::DEV_JWT_SECRET.to_string()),
            session_ttl: defaults::SESSION_TTL,
            sweep_interval: defaults::SWEEP_INTERVAL,
            token_lifetime: defaults::TOKEN_LIFETIME,
            seed_file: None,
        }
    }

    /// Create a test configuration with a fixed secret.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            base_url: defaults::BASE_URL.to_string(),
            jwt_secret: "test-signing-secret".to_string(),
            session_ttl: defaults::SESSION_TTL,
            sweep_interval: defaults::SWEEP_INTERVAL,
            token_lifetime: defaults::TOKEN_LIFETIME,
            seed_file: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `PORT`, `OAUTH_BASE_URL`, `OAUTH_JWT_SECRET` and `OAUTH_SEED_FILE`.
    ///
    /// # Errors
    ///
    /// Returns error if `PORT` is set but not a valid port number.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults::PORT,
        };
        let base_url = std::env::var("OAUTH_BASE_URL").ok();
        let jwt_secret = std::env::var("OAUTH_JWT_SECRET").ok();

        let mut config = Self::new(port, base_url, jwt_secret);
        config.seed_file = std::env::var_os("OAUTH_SEED_FILE").map(PathBuf::from);
        Ok(config)
    }

    /// Attach a seed file.
    #[must_use]
    pub fn with_seed_file(mut self, path: Option<PathBuf>) -> Self {
        self.seed_file = path;
        self
    }

    /// Check whether the built-in development secret is in use.
    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == defaults::DEV_JWT_SECRET
    }

    /// Absolute URL of an endpoint path on this server.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(defaults::PORT, None, None)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("token_lifetime", &self.token_lifetime)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}
