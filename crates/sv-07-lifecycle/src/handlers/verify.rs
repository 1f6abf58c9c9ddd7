use super::{check_extension_binding, Rejection};
use crate::app::Services;
use shared_types::{to_hex, RequestVerifyVoteExtension, ResponseVerifyVoteExtension};
use sv_01_state_store::Context;
use sv_03_vote_extension::{
    check_duplicate_votes, decode_vote_extension, validate_non_rp_extension, NonRpError,
};
use sv_telemetry::{metric_inc, VOTE_EXTENSIONS_REJECTED};
use tracing::{debug, error, warn};

impl Services {
    pub(crate) fn verify_vote_extension(
        &self,
        ctx: &mut Context<'_>,
        req: &RequestVerifyVoteExtension,
    ) -> ResponseVerifyVoteExtension {
        match self.check_vote_extension(ctx, req) {
            Ok(()) => ResponseVerifyVoteExtension::accept(),
            Err(rejection) => {
                metric_inc!(VOTE_EXTENSIONS_REJECTED, &[rejection.reason()]);
                warn!(
                    height = req.height,
                    validator = %to_hex(&req.validator_address),
                    error = %rejection,
                    "[sv-07] rejecting vote extension"
                );
                ResponseVerifyVoteExtension::reject()
            }
        }
    }

    fn check_vote_extension(
        &self,
        ctx: &Context<'_>,
        req: &RequestVerifyVoteExtension,
    ) -> Result<(), Rejection> {
        let height = req.height;
        if !self.config.vote_extensions_enabled(height) {
            if req.vote_extension.is_empty() && req.non_rp_vote_extension.is_empty() {
                return Ok(());
            }
            return Err(Rejection::UnexpectedExtension);
        }

        let extension = decode_vote_extension(&req.vote_extension).map_err(Rejection::Decode)?;
        check_extension_binding(&extension, height, &req.hash)?;
        check_duplicate_votes(extension.side_tx_responses()).map_err(Rejection::VoteExtension)?;

        if let Some(prop) = &extension.milestone_proposition {
            self.milestones
                .validate(ctx.store(), prop)
                .map_err(|e| Rejection::Milestone(e.to_string()))?;
        }

        match validate_non_rp_extension(
            ctx,
            &req.non_rp_vote_extension,
            height,
            &self.config.chain_id,
            self.non_rp.as_ref(),
        ) {
            Ok(()) => {}
            Err(NonRpError::Unavailable(reason)) => {
                warn!(
                    height,
                    validator = %to_hex(&req.validator_address),
                    %reason,
                    "[sv-07] cannot verify non-RP extension, accepting"
                );
            }
            Err(NonRpError::Invalid(reason)) => {
                error!(
                    height,
                    validator = %to_hex(&req.validator_address),
                    %reason,
                    "[sv-07] invalid non-RP extension, potential malicious validator"
                );
                return Err(Rejection::NonRp(reason));
            }
        }

        debug!(
            height,
            validator = %to_hex(&req.validator_address),
            votes = extension.side_tx_responses().len(),
            "[sv-07] vote extension verified"
        );
        Ok(())
    }
}
