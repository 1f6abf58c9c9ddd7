//! # Sidechain Validator Node Runtime
//!
//! Assembles the side-tx application and runs its background tasks.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and service assembly
//! - `adapters/` - runtime-owned port implementations
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment and validate it
//! 2. Assemble services and register side-tx handlers
//! 3. Load checkpoint and milestone genesis
//! 4. Request the payload for the next height
//! 5. Spawn the execution payload producer
//!
//! The replication engine drives [`SideTxApp`] through
//! [`NodeRuntime::app`]; the runtime itself never proposes blocks.

pub mod adapters;
pub mod container;

use parking_lot::Mutex;
use std::sync::Arc;
use sv_07_lifecycle::{ExecutionPayload, PayloadAttributes, SideTxApp};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use container::{ConfigError, NodeConfig, NodeError, ServiceContainer};

/// Running validator node.
pub struct NodeRuntime {
    services: Arc<ServiceContainer>,
    app: Arc<Mutex<SideTxApp>>,
    latest_payload: watch::Receiver<Option<ExecutionPayload>>,
    producer: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Assemble services, load genesis and spawn the payload producer.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(config: NodeConfig) -> Result<Self, NodeError> {
        info!("===========================================");
        info!("  Sidechain Validator v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let services = Arc::new(ServiceContainer::new(config)?);
        let (producer, payload) = services.payload_producer();
        let app = services.build_app()?;

        let next_height = app.last_committed_height().unwrap_or(0) + 1;
        payload.request(PayloadAttributes {
            height: next_height,
            timestamp: services.config.chain_start_time,
            parent_hash: Vec::new(),
        });
        let latest_payload = payload.subscribe();
        let app = app.with_payload(payload);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let producer = producer.spawn(shutdown_rx);

        info!(
            chain_id = %services.config.lifecycle.chain_id,
            next_height,
            ve_enable_height = services.config.lifecycle.vote_extensions_enable_height,
            "[runtime] node started"
        );

        Ok(Self {
            services,
            app: Arc::new(Mutex::new(app)),
            latest_payload,
            producer: Some(producer),
            shutdown_tx,
        })
    }

    pub fn services(&self) -> &Arc<ServiceContainer> {
        &self.services
    }

    /// The application, for the replication engine to drive.
    pub fn app(&self) -> Arc<Mutex<SideTxApp>> {
        self.app.clone()
    }

    /// Watch the payloads the producer publishes.
    pub fn payloads(&self) -> watch::Receiver<Option<ExecutionPayload>> {
        self.latest_payload.clone()
    }

    /// Stop background tasks and wait for them to exit.
    pub async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        if let Some(producer) = self.producer.take() {
            if let Err(e) = producer.await {
                error!("Payload producer task failed: {}", e);
            }
        }

        info!("Shutdown complete");
    }
}
