//! parlord - the Parlor chat server binary.

use parlor::config::Config;
use parlor::db::Database;
use parlor::engine::sweep;
use parlor::gateway;
use parlor::state::Hub;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting parlord");

    // Initialize database
    let db_path = config
        .database
        .as_ref()
        .map(|d| d.path.as_str())
        .unwrap_or("parlor.db");
    let db = Database::new(db_path).await?;

    let hub = Hub::new(db, config);

    // Retire idle channels at startup and then on the configured
    // interval.
    if hub.config.sweep.enabled {
        sweep::spawn(hub.clone());
        info!("Inactivity sweep task started");
    } else {
        info!("Inactivity sweep disabled");
    }

    gateway::serve(hub).await?;

    Ok(())
}
