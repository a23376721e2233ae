//! Meterd - Main Entry Point
//! Hosts measurement modules and refreshes them on a schedule

mod agent;
mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

use settings::AgentConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    telemetry::init_logging()?;
    info!("Meterd v{} starting...", VERSION);

    // 2. Load configuration
    let config_path = settings::config_path()?;
    info!(config = %config_path.display(), "Loading configuration...");
    let config = AgentConfig::load(&config_path)?;

    // 3. Build modules (background units start here)
    let modules = agent::build_modules(config.modules).context("Module setup failed")?;
    info!(modules = modules.len(), "Modules ready");

    // 4. Refresh loop
    let mut ticker = tokio::time::interval(Duration::from_secs(config.refresh_interval_secs));
    info!("Press Ctrl+C to shutdown");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let round = modules.clone();
                let snapshot = tokio::task::spawn_blocking(move || {
                    agent::refresh_all(&round);
                    agent::snapshot_json(&round)
                })
                .await
                .context("Refresh round aborted")?;
                debug!(snapshot = %snapshot, "Current values");
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    // Detached background units are not awaited
    info!("Shutdown signal received. Exiting.");
    Ok(())
}
