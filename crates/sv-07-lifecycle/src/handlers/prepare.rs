use super::execute_tx;
use crate::app::Services;
use crate::error::{LifecycleError, LifecycleResult};
use shared_types::{to_hex, tx_hash, RequestPrepareProposal, ResponsePrepareProposal};
use sv_01_state_store::Context;
use sv_03_vote_extension::encode_commit_info;
use tracing::{debug, info};

impl Services {
    /// Build the proposal: the extended commit of the previous height first,
    /// then every mempool tx that fits and survives a dry-run.
    pub(crate) fn prepare_proposal(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestPrepareProposal,
    ) -> LifecycleResult<ResponsePrepareProposal> {
        let height = req.height;
        let limit = self.config.tx_byte_limit(req.max_tx_bytes);
        let mut txs = Vec::with_capacity(req.txs.len() + 1);
        let mut used: i64 = 0;

        if self.config.carries_last_commit(height) {
            let commit = encode_commit_info(&req.local_last_commit)?;
            used += commit.len() as i64;
            txs.push(commit);
        }

        let registry = self.registry.as_ref();
        ctx.with_discarded_cache(|dry| {
            for bytes in &req.txs {
                let size = bytes.len() as i64;
                if used + size > limit {
                    debug!(height, size, used, limit, "[sv-07] tx does not fit proposal");
                    continue;
                }
                match execute_tx(registry, dry, bytes) {
                    Ok(_) => {
                        used += size;
                        txs.push(bytes.clone());
                    }
                    Err(err) => debug!(
                        height,
                        tx_hash = %to_hex(&tx_hash(bytes)),
                        error = %err,
                        "[sv-07] dropping tx from proposal"
                    ),
                }
            }
        });

        if txs.is_empty() {
            return Err(LifecycleError::EmptyProposal { height });
        }

        let execution_payload = self
            .payload
            .as_ref()
            .and_then(|handle| handle.payload_for(height))
            .unwrap_or_default();

        info!(
            height,
            txs = txs.len(),
            bytes = used,
            payload = execution_payload.len(),
            "[sv-07] prepared proposal"
        );
        Ok(ResponsePrepareProposal {
            txs,
            execution_payload,
        })
    }
}
