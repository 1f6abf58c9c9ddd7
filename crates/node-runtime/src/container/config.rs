//! # Node Configuration
//!
//! Defaults for every subsystem, overridden from `SV_*` environment
//! variables and validated before the node starts.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SV_CHAIN_ID` | `lifecycle.chain_id` |
//! | `SV_VE_ENABLE_HEIGHT` | `lifecycle.vote_extensions_enable_height` |
//! | `SV_MAX_TX_BYTES` | `lifecycle.max_tx_bytes` |
//! | `SV_CHECKPOINT_BUFFER_TIME` | `checkpoint.checkpoint_buffer_time` (seconds) |
//! | `SV_MAX_CHECKPOINT_LENGTH` | `checkpoint.max_checkpoint_length` |
//! | `SV_BOR_CHAIN_ID` | child chain id of checkpoints and milestones |
//! | `SV_MILESTONE_MAX_LENGTH` | `milestone.max_milestone_proposition_length` |
//! | `SV_PAYLOAD_HANDSHAKE_TIMEOUT_MS` | `payload.handshake_timeout_ms` |
//! | `SV_PAYLOAD_BASE_BACKOFF_MS` | `payload.base_backoff_ms` |
//! | `SV_VALIDATOR_KEY` | hex secp256k1 secret of the local validator |
//! | `SV_VALIDATOR_POWER` | voting power of the local validator |
//! | `SV_CHAIN_START_TIME` | unix seconds of chain start |

use serde::Deserialize;
use std::str::FromStr;
use sv_05_checkpoint::Params as CheckpointParams;
use sv_06_milestone::Params as MilestoneParams;
use sv_07_lifecycle::{LifecycleConfig, PayloadProducerConfig};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub lifecycle: LifecycleConfig,
    pub checkpoint: CheckpointParams,
    pub milestone: MilestoneParams,
    pub payload: PayloadProducerConfig,
    /// Secret key of the local validator. A random key is used when unset.
    #[serde(skip)]
    pub validator_key: Option<[u8; 32]>,
    pub validator_power: i64,
    pub chain_start_time: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleConfig::default(),
            checkpoint: CheckpointParams::default(),
            milestone: MilestoneParams::default(),
            payload: PayloadProducerConfig::default(),
            validator_key: None,
            validator_power: 10,
            chain_start_time: 0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("SV_VALIDATOR_KEY must be 32 bytes (64 hex chars)")]
    InvalidValidatorKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(chain_id) = lookup("SV_CHAIN_ID") {
            config.lifecycle.chain_id = chain_id;
        }
        override_parsed(&lookup, "SV_VE_ENABLE_HEIGHT", &mut config.lifecycle.vote_extensions_enable_height)?;
        override_parsed(&lookup, "SV_MAX_TX_BYTES", &mut config.lifecycle.max_tx_bytes)?;
        override_parsed(&lookup, "SV_CHECKPOINT_BUFFER_TIME", &mut config.checkpoint.checkpoint_buffer_time)?;
        override_parsed(&lookup, "SV_MAX_CHECKPOINT_LENGTH", &mut config.checkpoint.max_checkpoint_length)?;
        override_parsed(
            &lookup,
            "SV_MILESTONE_MAX_LENGTH",
            &mut config.milestone.max_milestone_proposition_length,
        )?;
        override_parsed(&lookup, "SV_PAYLOAD_HANDSHAKE_TIMEOUT_MS", &mut config.payload.handshake_timeout_ms)?;
        override_parsed(&lookup, "SV_PAYLOAD_BASE_BACKOFF_MS", &mut config.payload.base_backoff_ms)?;
        override_parsed(&lookup, "SV_VALIDATOR_POWER", &mut config.validator_power)?;
        override_parsed(&lookup, "SV_CHAIN_START_TIME", &mut config.chain_start_time)?;

        if let Some(bor_chain_id) = lookup("SV_BOR_CHAIN_ID") {
            config.checkpoint.bor_chain_id = bor_chain_id.clone();
            config.milestone.bor_chain_id = bor_chain_id;
        }

        if let Some(key_hex) = lookup("SV_VALIDATOR_KEY") {
            let bytes = hex::decode(key_hex.trim_start_matches("0x"))
                .map_err(|_| ConfigError::InvalidValidatorKey)?;
            let key: [u8; 32] = bytes
                .try_into()
                .map_err(|_| ConfigError::InvalidValidatorKey)?;
            config.validator_key = Some(key);
        }

        Ok(config)
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.lifecycle.chain_id.is_empty() {
            return invalid("chain id must not be empty");
        }
        if self.lifecycle.vote_extensions_enable_height < 0 {
            return invalid("vote extension enable height must not be negative");
        }
        if self.lifecycle.max_tx_bytes <= 0 {
            return invalid("max tx bytes must be positive");
        }
        if self.checkpoint.checkpoint_buffer_time == 0 {
            return invalid("checkpoint buffer time must be positive");
        }
        if self.checkpoint.max_checkpoint_length == 0
            || self.checkpoint.avg_checkpoint_length > self.checkpoint.max_checkpoint_length
        {
            return invalid("checkpoint length limits are inconsistent");
        }
        if self.milestone.max_milestone_proposition_length == 0 {
            return invalid("milestone proposition length must be positive");
        }
        if self.milestone.span_buffer >= self.milestone.span_length {
            return invalid("span buffer must be shorter than a span");
        }
        if self.payload.handshake_timeout_ms == 0 {
            return invalid("payload handshake timeout must be positive");
        }
        if self.validator_power <= 0 {
            return invalid("validator power must be positive");
        }
        Ok(())
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(var) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value })?;
    }
    Ok(())
}
