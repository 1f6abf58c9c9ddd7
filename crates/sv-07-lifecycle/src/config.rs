//! Lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Lifecycle settings shared by every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Chain id bound into every extension signature.
    pub chain_id: String,
    /// First height whose precommits carry vote extensions. 0 disables them.
    pub vote_extensions_enable_height: i64,
    /// Local cap on the tx section of a proposal. The engine's limit applies
    /// when it is smaller.
    pub max_tx_bytes: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            chain_id: "sidechain-1".to_string(),
            vote_extensions_enable_height: 1,
            max_tx_bytes: 1_048_576,
        }
    }
}

impl LifecycleConfig {
    /// Whether precommits of `height` carry vote extensions.
    pub fn vote_extensions_enabled(&self, height: i64) -> bool {
        self.vote_extensions_enable_height > 0 && height >= self.vote_extensions_enable_height
    }

    /// Whether the block at `height` embeds the extended commit of
    /// `height - 1` as tx 0.
    pub fn carries_last_commit(&self, height: i64) -> bool {
        self.vote_extensions_enabled(height - 1)
    }

    /// Byte budget for a proposal given the engine's `max_tx_bytes`.
    pub fn tx_byte_limit(&self, engine_max: i64) -> i64 {
        if engine_max > 0 {
            engine_max.min(self.max_tx_bytes)
        } else {
            self.max_tx_bytes
        }
    }
}
