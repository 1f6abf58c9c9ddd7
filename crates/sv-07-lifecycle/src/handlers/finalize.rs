use super::execute_tx;
use crate::app::{Services, LAST_BLOCK_TXS_KEY};
use crate::error::LifecycleResult;
use shared_types::{ExecTxResult, RequestFinalizeBlock, ResponseFinalizeBlock};
use sv_01_state_store::{put_typed, Context};
use tracing::{debug, info};

impl Services {
    /// PreBlock, then deterministic delivery of every tx after tx 0.
    pub(crate) fn finalize_block(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestFinalizeBlock,
    ) -> LifecycleResult<ResponseFinalizeBlock> {
        let height = req.height;
        self.pre_block(ctx, req)?;
        let events = ctx.take_events();

        let first = usize::from(self.config.carries_last_commit(height));
        let mut tx_results = Vec::with_capacity(req.txs.len());
        if first == 1 {
            // tx 0 is the extended commit, consumed by PreBlock
            tx_results.push(ExecTxResult::default());
        }

        for bytes in req.txs.iter().skip(first) {
            let result = match execute_tx(&self.registry, ctx, bytes) {
                Ok(_) => ExecTxResult {
                    events: ctx.take_events(),
                    ..Default::default()
                },
                Err(err) => {
                    debug!(height, error = %err, "[sv-07] tx failed");
                    ExecTxResult {
                        code: err.code,
                        codespace: err.codespace,
                        log: err.log,
                        events: Vec::new(),
                    }
                }
            };
            tx_results.push(result);
        }
        ctx.set_tx_hash(Vec::new());

        put_typed(ctx.store_mut(), LAST_BLOCK_TXS_KEY, &req.txs)?;

        let failed = tx_results.iter().filter(|r| !r.is_ok()).count();
        info!(height, txs = req.txs.len(), failed, "[sv-07] finalized block");
        Ok(ResponseFinalizeBlock { events, tx_results })
    }
}
