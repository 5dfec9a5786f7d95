//! relayd - minimal line-oriented chat relay server.

use relayd::config::Config;
use relayd::network::Gateway;
use relayd::state::{Matrix, spawn_disconnect_worker};
use std::sync::Arc;
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

    info!(
        server = %config.server.name,
        network = %config.server.network,
        "Starting relayd"
    );

    let (matrix, disconnect_rx) = Matrix::new(&config);
    let matrix = Arc::new(matrix);
    spawn_disconnect_worker(Arc::clone(&matrix), disconnect_rx);

    let gateway = Gateway::bind(config.listen.address, matrix).await?;
    gateway.run().await
}
