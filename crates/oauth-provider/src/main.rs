//! OAuth2 Provider - Entry Point
//!
//! Serves the authorization server and the user-info resource over HTTP.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use oauth_provider::{AuthServer, config::Config, models::load_fixtures};

#[derive(Parser, Debug)]
#[command(name = "oauth-provider")]
#[command(about = "OAuth2 authorization code server with a user-info resource")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Public base URL used in redirects and metadata (e.g., https://auth.example.com)
    #[arg(long, env = "OAUTH_BASE_URL")]
    base_url: Option<String>,

    /// HMAC secret for signing access tokens
    #[arg(long, env = "OAUTH_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// JSON file with registered applications and users (demo data if omitted)
    #[arg(long, env = "OAUTH_SEED_FILE")]
    seed_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cli.port,
        base_url = ?cli.base_url,
        "Starting OAuth2 provider"
    );

    let config = Config::new(cli.port, cli.base_url, cli.jwt_secret).with_seed_file(cli.seed_file);
    let (registry, directory) = load_fixtures(config.seed_file.as_deref())?;

    AuthServer::new(config, registry, directory).run_http().await
}
