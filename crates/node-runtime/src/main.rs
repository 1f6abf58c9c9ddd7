//! # Sidechain Validator Node
//!
//! Entry point: telemetry, configuration, node assembly, then wait for
//! Ctrl+C.

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use sv_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let node = NodeRuntime::start(config).context("Failed to start node")?;
    info!(
        validator = %hex::encode(node.services().validator_address()),
        "Node running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    node.shutdown().await;
    Ok(())
}
