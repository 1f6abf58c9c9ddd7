//! Execution engine that builds payloads in-process.
//!
//! Stands in for an external execution client in development mode. Payloads
//! are deterministic: the same attributes always yield the same block hash.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_crypto::sha256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use sv_07_lifecycle::{EngineError, ExecutionEngine, ExecutionPayload, PayloadAttributes, PayloadId};
use tracing::debug;

#[derive(Default)]
pub struct LocalExecutionEngine {
    next_id: AtomicU64,
    building: Mutex<HashMap<PayloadId, PayloadAttributes>>,
}

impl LocalExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads started but not yet fetched.
    pub fn pending(&self) -> usize {
        self.building.lock().len()
    }
}

fn block_hash(attributes: &PayloadAttributes) -> Vec<u8> {
    let mut preimage = Vec::with_capacity(attributes.parent_hash.len() + 16);
    preimage.extend_from_slice(&attributes.parent_hash);
    preimage.extend_from_slice(&attributes.height.to_be_bytes());
    preimage.extend_from_slice(&attributes.timestamp.to_be_bytes());
    sha256(&preimage).to_vec()
}

#[async_trait]
impl ExecutionEngine for LocalExecutionEngine {
    async fn forkchoice_updated(
        &self,
        attributes: &PayloadAttributes,
    ) -> Result<PayloadId, EngineError> {
        let id = PayloadId(self.next_id.fetch_add(1, Ordering::SeqCst).to_be_bytes());
        self.building.lock().insert(id.clone(), attributes.clone());
        debug!(height = attributes.height, "[runtime] local payload started");
        Ok(id)
    }

    async fn get_payload(&self, id: &PayloadId) -> Result<ExecutionPayload, EngineError> {
        let attributes = self
            .building
            .lock()
            .remove(id)
            .ok_or_else(|| EngineError::Rejected(format!("unknown payload id {}", hex::encode(id.0))))?;

        let block_hash = block_hash(&attributes);
        let data = serde_json::to_vec(&serde_json::json!({
            "height": attributes.height,
            "timestamp": attributes.timestamp,
            "parentHash": hex::encode(&attributes.parent_hash),
            "blockHash": hex::encode(&block_hash),
        }))
        .map_err(|e| EngineError::Rejected(e.to_string()))?;

        Ok(ExecutionPayload {
            height: attributes.height,
            block_hash,
            data,
        })
    }
}
