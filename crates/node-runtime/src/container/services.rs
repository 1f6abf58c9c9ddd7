//! Service assembly and genesis.

use crate::adapters::LocalExecutionEngine;
use crate::container::config::NodeConfig;
use shared_crypto::Secp256k1KeyPair;
use shared_types::{Address, Validator, ValidatorSet};
use std::sync::Arc;
use sv_01_state_store::MemStore;
use sv_02_side_tx::{RegistryError, SideTxRegistry};
use sv_05_checkpoint::adapters::{InMemoryChildChain, InMemoryRootChain, StaticValidatorSet};
use sv_05_checkpoint::{CheckpointError, CheckpointModule, GenesisState as CheckpointGenesis};
use sv_06_milestone::{GenesisState as MilestoneGenesis, MilestoneError, MilestoneService, Span};
use sv_07_lifecycle::{PayloadHandle, PayloadProducer, SideTxApp};
use thiserror::Error;
use tracing::info;

/// Node assembly errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid validator key: {0}")]
    ValidatorKey(String),

    #[error("handler registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("checkpoint genesis failed: {0}")]
    CheckpointGenesis(#[from] CheckpointError),

    #[error("milestone genesis failed: {0}")]
    MilestoneGenesis(#[from] MilestoneError),
}

/// Collaborators shared between the application and the runtime tasks.
pub struct ServiceContainer {
    pub config: NodeConfig,
    pub key: Secp256k1KeyPair,
    pub validator_set: ValidatorSet,
    pub child_chain: Arc<InMemoryChildChain>,
    pub root_chain: Arc<InMemoryRootChain>,
    pub validators: Arc<StaticValidatorSet>,
    pub checkpoints: Arc<CheckpointModule>,
    pub milestones: Arc<MilestoneService>,
    pub registry: Arc<SideTxRegistry>,
    pub engine: Arc<LocalExecutionEngine>,
}

impl ServiceContainer {
    /// Build every service for a single-validator development network.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let key = match config.validator_key {
            Some(secret) => Secp256k1KeyPair::from_bytes(secret)
                .map_err(|e| NodeError::ValidatorKey(e.to_string()))?,
            None => Secp256k1KeyPair::generate(),
        };
        let validator_set = ValidatorSet::new(vec![Validator::new(
            key.address(),
            key.public_key().as_bytes().to_vec(),
            config.validator_power,
        )]);

        let child_chain = Arc::new(InMemoryChildChain::new());
        let root_chain = Arc::new(InMemoryRootChain::new());
        let validators = Arc::new(StaticValidatorSet::new(validator_set.clone()));

        let checkpoints = Arc::new(CheckpointModule::new(
            child_chain.clone(),
            root_chain.clone(),
            validators.clone(),
        ));
        let mut registry = SideTxRegistry::new();
        checkpoints.clone().register(&mut registry)?;
        let milestones = Arc::new(MilestoneService::new(child_chain.clone()));

        info!(
            validator = %hex::encode(key.address()),
            chain_id = %config.lifecycle.chain_id,
            "[runtime] services assembled"
        );

        Ok(Self {
            config,
            key,
            validator_set,
            child_chain,
            root_chain,
            validators,
            checkpoints,
            milestones,
            registry: Arc::new(registry),
            engine: Arc::new(LocalExecutionEngine::new()),
        })
    }

    pub fn validator_address(&self) -> Address {
        self.key.address()
    }

    /// Application over a fresh store with genesis loaded.
    pub fn build_app(&self) -> Result<SideTxApp, NodeError> {
        let mut app = SideTxApp::new(
            self.config.lifecycle.clone(),
            Box::new(MemStore::new()),
            self.registry.clone(),
            self.checkpoints.clone(),
            self.milestones.clone(),
            self.validators.clone(),
        );
        self.load_genesis(&mut app)?;
        Ok(app)
    }

    fn load_genesis(&self, app: &mut SideTxApp) -> Result<(), NodeError> {
        let checkpoint_genesis = CheckpointGenesis {
            params: self.config.checkpoint.clone(),
            chain_start_time: self.config.chain_start_time,
            ..Default::default()
        };
        sv_05_checkpoint::init_genesis(app.store_mut(), &checkpoint_genesis, &self.validator_set)?;

        let milestone_genesis = MilestoneGenesis {
            params: self.config.milestone.clone(),
            spans: vec![Span {
                id: 0,
                start_block: 0,
                end_block: self.config.milestone.span_length.saturating_sub(1),
                producer: self.validator_address(),
            }],
        };
        sv_06_milestone::init_genesis(app.store_mut(), &milestone_genesis)?;

        info!("[runtime] genesis loaded");
        Ok(())
    }

    /// Producer task and the handle the application keeps.
    pub fn payload_producer(&self) -> (PayloadProducer, PayloadHandle) {
        PayloadProducer::new(self.engine.clone(), self.config.payload.clone())
    }
}
