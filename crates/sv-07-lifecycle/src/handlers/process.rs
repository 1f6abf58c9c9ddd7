use super::{execute_tx, Rejection};
use crate::app::Services;
use shared_types::{
    to_hex, BlockIdFlag, ExtendedCommitInfo, RequestProcessProposal, ResponseProcessProposal,
};
use sv_01_state_store::Context;
use sv_03_vote_extension::{
    decode_commit_info, validate_non_rp_extension, validate_vote_extensions,
    ExtendedCommitParams, NonRpError,
};
use sv_telemetry::{metric_inc, PROPOSALS_REJECTED};
use tracing::{debug, warn};

impl Services {
    pub(crate) fn process_proposal(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestProcessProposal,
    ) -> ResponseProcessProposal {
        match self.check_proposal(ctx, req) {
            Ok(()) => {
                debug!(height = req.height, txs = req.txs.len(), "[sv-07] proposal accepted");
                ResponseProcessProposal::accept()
            }
            Err(rejection) => {
                metric_inc!(PROPOSALS_REJECTED, &[rejection.reason()]);
                warn!(
                    height = req.height,
                    proposer = %to_hex(&req.proposer_address),
                    error = %rejection,
                    "[sv-07] rejecting proposal"
                );
                ResponseProcessProposal::reject()
            }
        }
    }

    fn check_proposal(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestProcessProposal,
    ) -> Result<(), Rejection> {
        let height = req.height;
        let mut first = 0;

        if self.config.carries_last_commit(height) {
            let bytes = req.txs.first().ok_or(Rejection::MissingCommit)?;
            let commit = decode_commit_info(bytes).map_err(Rejection::Decode)?;
            if commit.round != req.proposed_last_commit.round {
                return Err(Rejection::RoundMismatch {
                    decoded: commit.round,
                    recorded: req.proposed_last_commit.round,
                });
            }

            let voted_at = height - 1;
            let set = self
                .validators
                .validator_set(voted_at)
                .ok_or(Rejection::NoValidatorSet(voted_at))?;
            validate_vote_extensions(&ExtendedCommitParams {
                commit: &commit,
                height: voted_at,
                chain_id: &self.config.chain_id,
                validators: &set,
            })
            .map_err(Rejection::VoteExtension)?;
            self.check_non_rp_extensions(ctx, &commit, voted_at)?;
            first = 1;
        }

        let registry = self.registry.as_ref();
        ctx.with_discarded_cache(|dry| {
            for (index, bytes) in req.txs.iter().enumerate().skip(first) {
                execute_tx(registry, dry, bytes).map_err(|source| Rejection::Tx { index, source })?;
            }
            Ok(())
        })
    }

    /// Integrity of every committed non-RP extension. External data being
    /// unreachable is not a reason to reject.
    fn check_non_rp_extensions(
        &self,
        ctx: &Context<'_>,
        commit: &ExtendedCommitInfo,
        voted_at: i64,
    ) -> Result<(), Rejection> {
        for vote in &commit.votes {
            if vote.block_id_flag != BlockIdFlag::Commit {
                continue;
            }
            let validator = to_hex(&vote.validator.address);
            match validate_non_rp_extension(
                ctx,
                &vote.non_rp_vote_extension,
                voted_at,
                &self.config.chain_id,
                self.non_rp.as_ref(),
            ) {
                Ok(()) => {}
                Err(NonRpError::Unavailable(reason)) => {
                    warn!(%validator, %reason, "[sv-07] cannot verify non-RP extension, tolerating");
                }
                Err(NonRpError::Invalid(reason)) => {
                    return Err(Rejection::NonRp(format!("{validator}: {reason}")));
                }
            }
        }
        Ok(())
    }
}
