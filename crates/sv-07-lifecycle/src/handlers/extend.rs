use super::admit_tx;
use crate::app::Services;
use crate::error::LifecycleResult;
use shared_types::{
    to_hex, tx_hash, ConsolidatedSideTxResponse, RequestExtendVote, ResponseExtendVote,
    SideTxResponse, Vote, VoteExtension,
};
use std::collections::HashSet;
use sv_01_state_store::Context;
use sv_03_vote_extension::{decode_commit_info, dummy_non_rp_extension, encode_vote_extension};
use sv_telemetry::{metric_inc, SIDE_TX_VOTES};
use tracing::{debug, info, warn};

impl Services {
    /// Vote on every side message of the proposed block.
    ///
    /// Side handlers see a discarded cache, so nothing written here survives.
    pub(crate) fn extend_vote(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestExtendVote,
    ) -> LifecycleResult<ResponseExtendVote> {
        let height = req.height;
        if !self.config.vote_extensions_enabled(height) {
            debug!(height, "[sv-07] vote extensions disabled at this height");
            return Ok(ResponseExtendVote::default());
        }

        let mut first = 0;
        if self.config.carries_last_commit(height) {
            match req.txs.first().map(|bytes| decode_commit_info(bytes)) {
                Some(Ok(_)) => first = 1,
                Some(Err(err)) => {
                    warn!(height, error = %err, "[sv-07] undecodable tx 0, extending empty vote");
                    return Ok(ResponseExtendVote::default());
                }
                None => {
                    warn!(height, "[sv-07] block without extended commit, extending empty vote");
                    return Ok(ResponseExtendVote::default());
                }
            }
        }

        let mut responses = Vec::new();
        let mut seen = HashSet::new();
        let mut non_rp = None;

        for bytes in req.txs.iter().skip(first) {
            let hash = tx_hash(bytes);
            if !seen.insert(hash) {
                continue;
            }
            let tx = match admit_tx(&self.registry, bytes) {
                Ok(tx) => tx,
                Err(err) => {
                    debug!(height, tx_hash = %to_hex(&hash), error = %err, "[sv-07] skipping tx");
                    continue;
                }
            };
            let Some((msg, handler)) = self.registry.side_msg(&tx) else {
                continue;
            };

            ctx.set_tx_hash(hash.to_vec());
            let vote = ctx.with_discarded_cache(|side| handler.side_handler(side, msg));
            metric_inc!(SIDE_TX_VOTES, &[vote.as_str()]);
            debug!(
                height,
                tx_hash = %to_hex(&hash),
                msg_type = %msg.type_url,
                %vote,
                "[sv-07] side tx evaluated"
            );

            if vote == Vote::Yes && non_rp.is_none() {
                non_rp = ctx.with_discarded_cache(|side| handler.non_rp_sign_bytes(side, msg));
            }
            responses.push(SideTxResponse::new(hash.to_vec(), vote));
        }
        ctx.set_tx_hash(Vec::new());

        let milestone = match self.milestones.propose(ctx.store()) {
            Ok(prop) => prop,
            Err(err) => {
                warn!(height, error = %err, "[sv-07] no milestone proposition this height");
                None
            }
        };

        let votes = responses.len();
        let extension = VoteExtension {
            consolidated_side_tx_response: ConsolidatedSideTxResponse {
                side_tx_responses: responses,
                height,
                block_hash: req.hash.clone(),
            },
            milestone_proposition: milestone,
        };
        let vote_extension = encode_vote_extension(&extension)?;
        let has_non_rp = non_rp.is_some();
        let non_rp_extension =
            non_rp.unwrap_or_else(|| dummy_non_rp_extension(height, &self.config.chain_id));

        info!(
            height,
            votes,
            milestone = extension.milestone_proposition.is_some(),
            non_rp = has_non_rp,
            "[sv-07] extended vote"
        );
        Ok(ResponseExtendVote {
            vote_extension,
            non_rp_extension,
        })
    }
}
