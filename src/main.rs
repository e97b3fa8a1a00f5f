//! Dock Health webhook callback server
//!
//! Answers verification challenges and receives signed event deliveries
//! on `callback.host:callback.local_port` until interrupted.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dockhealth_client::config::{self, AppConfig};
use dockhealth_client::CallbackServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Dock Health callback server v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    tracing::info!(
        host = %config.callback.host,
        port = config.callback.local_port,
        "Configuration loaded"
    );

    let mut server = CallbackServer::start(&config.callback, config.callback.secrets())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start callback server: {}", e))?;

    shutdown_signal().await;
    tracing::info!(
        events = server.received_events().len(),
        challenges = server.challenge_count(),
        "Shutdown signal received"
    );

    server
        .stop()
        .await
        .map_err(|e| anyhow::anyhow!("Callback server did not stop cleanly: {}", e))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
}

/// Initialize tracing with JSON output
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dockhealth_client=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load configuration; only the callback secret is required here
fn load_config() -> anyhow::Result<AppConfig> {
    config::load_dotenv();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    if config.callback.secrets().is_empty() {
        return Err(anyhow::anyhow!("CALLBACK_SECRET is undefined!"));
    }

    Ok(config)
}
