use crate::app::{Services, LAST_BLOCK_TXS_KEY};
use crate::error::{LifecycleError, LifecycleResult};
use shared_types::{to_hex, tx_hash, RequestFinalizeBlock, Tx, Vote};
use std::collections::BTreeSet;
use sv_01_state_store::{get_typed, Context};
use sv_03_vote_extension::decode_commit_info;
use sv_04_vote_tally::tally_votes;
use sv_telemetry::{time_histogram, PRE_BLOCK_DURATION};
use tracing::{debug, info, warn};

impl Services {
    /// Apply the outcome of the previous height's side-tx votes.
    ///
    /// The extended commit in tx 0 already carried a supermajority, so
    /// anything here that cannot be decoded is fatal.
    pub(crate) fn pre_block(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestFinalizeBlock,
    ) -> LifecycleResult<()> {
        let height = req.height;
        if !self.config.carries_last_commit(height) {
            return Ok(());
        }
        let _timer = time_histogram!(PRE_BLOCK_DURATION);

        let bytes = req
            .txs
            .first()
            .ok_or_else(|| LifecycleError::fatal(height, "finalized block has no extended commit"))?;
        let commit = decode_commit_info(bytes)
            .map_err(|e| LifecycleError::fatal(height, format!("undecodable extended commit: {e}")))?;

        let voted_at = height - 1;
        let set = self.validators.validator_set(voted_at).ok_or_else(|| {
            LifecycleError::fatal(height, format!("no validator set for height {voted_at}"))
        })?;

        let outcome = tally_votes(&commit.votes, set.total_power())
            .map_err(|e| LifecycleError::fatal(height, e))?;

        let milestones = self.milestones.as_ref();
        let milestone = ctx
            .with_cache(|c| milestones.apply_majority(c, &commit.votes, &set))
            .map_err(|e| LifecycleError::fatal(height, e))?;
        if let Some(committed) = &milestone.committed {
            info!(
                height,
                number = committed.number,
                end_block = committed.end_block,
                "[sv-07] milestone committed"
            );
        }

        let previous: Vec<Vec<u8>> = get_typed(ctx.store(), LAST_BLOCK_TXS_KEY)?.unwrap_or_default();
        let mut applied = 0usize;
        // One post handler per tx hash, however often the tx was included.
        let mut seen = BTreeSet::new();
        for bytes in &previous {
            let hash = tx_hash(bytes);
            if !outcome.is_approved(&hash) || !seen.insert(hash) {
                continue;
            }
            let tx = match Tx::decode(bytes) {
                Ok(tx) => tx,
                Err(err) => {
                    warn!(height, tx_hash = %to_hex(&hash), error = %err, "[sv-07] approved tx no longer decodes");
                    continue;
                }
            };
            let Some((msg, handler)) = self.registry.post_msg(&tx) else {
                debug!(height, tx_hash = %to_hex(&hash), "[sv-07] approved tx has no post handler");
                continue;
            };

            ctx.set_tx_hash(hash.to_vec());
            match ctx.with_cache(|c| handler.post_handler(c, msg, Vote::Yes)) {
                Ok(()) => applied += 1,
                Err(err) => warn!(
                    height,
                    tx_hash = %to_hex(&hash),
                    error = %err,
                    "[sv-07] post handler failed, changes discarded"
                ),
            }
        }
        ctx.set_tx_hash(Vec::new());

        info!(
            height,
            approved = outcome.approved.len(),
            rejected = outcome.rejected.len(),
            applied,
            "[sv-07] pre-block complete"
        );
        Ok(())
    }
}
