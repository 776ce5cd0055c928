use access_gate::config::{self, GateConfig};
use access_gate::server;
use tracing_subscriber::{self, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Also captures `log` records emitted by the library.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_ansi(false)
        .init();

    match config::load_dotenv().inspect_err(|e| tracing::error!("{e}"))? {
        Some(path) => tracing::info!("loaded environment from {}", path.display()),
        None => tracing::info!("no .env file found, using process environment"),
    }

    let config = GateConfig::from_env().inspect_err(|e| {
        tracing::error!("invalid configuration: {e}");
    })?;

    if std::env::var("APP_KEY").map(|v| v.trim().is_empty()).unwrap_or(true) {
        tracing::warn!("APP_KEY not set, using the built-in development key");
    }

    tracing::info!(?config, "access-gate starting");

    server::start_server(config).await
}
