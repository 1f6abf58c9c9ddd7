//! Validation of extended-commit data and of a single validator's votes.

use crate::codec::decode_vote_extension;
use crate::error::{VoteExtensionError, VoteExtensionResult};
use crate::signing::vote_extension_sign_bytes;
use shared_crypto::verify_signature;
use shared_types::{
    supermajority_threshold, to_hex, BlockIdFlag, ExtendedCommitInfo, SideTxResponse,
    ValidatorSet,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// What an extended commit is checked against.
pub struct ExtendedCommitParams<'a> {
    pub commit: &'a ExtendedCommitInfo,
    /// Height the votes were cast at.
    pub height: i64,
    pub chain_id: &'a str,
    /// Validator set at `height`.
    pub validators: &'a ValidatorSet,
}

/// Check every committing vote of an extended commit.
///
/// - non-commit votes carry no extension data
/// - each committing validator is in the set, once, with matching power
/// - both extension signatures verify under the validator's consensus key
/// - each extension decodes, is bound to `height` and votes once per tx
/// - the committing power is at least `⌊2·total/3⌋ + 1`
pub fn validate_vote_extensions(params: &ExtendedCommitParams<'_>) -> VoteExtensionResult<()> {
    let mut seen = HashSet::with_capacity(params.commit.votes.len());
    let mut signed_power: i64 = 0;

    for vote in &params.commit.votes {
        let address = vote.validator.address;

        if !seen.insert(address) {
            return Err(VoteExtensionError::DuplicateValidator { validator: address });
        }

        if vote.block_id_flag != BlockIdFlag::Commit {
            if !vote.vote_extension.is_empty()
                || !vote.extension_signature.is_empty()
                || !vote.non_rp_vote_extension.is_empty()
                || !vote.non_rp_extension_signature.is_empty()
            {
                return Err(VoteExtensionError::UnexpectedExtension { validator: address });
            }
            continue;
        }

        let validator = params
            .validators
            .get(&address)
            .ok_or(VoteExtensionError::UnknownValidator { validator: address })?;

        if validator.voting_power != vote.validator.power {
            return Err(VoteExtensionError::PowerMismatch {
                validator: address,
                expected: validator.voting_power,
                actual: vote.validator.power,
            });
        }

        if vote.vote_extension.is_empty() {
            return Err(VoteExtensionError::EmptyExtension { validator: address });
        }

        let sign_bytes = vote_extension_sign_bytes(
            &vote.vote_extension,
            params.height,
            params.commit.round,
            params.chain_id,
        );
        verify_signature(&validator.pub_key, &sign_bytes, &vote.extension_signature).map_err(
            |e| {
                warn!(validator = %to_hex(&address), error = %e, "[sv-03] bad extension signature");
                VoteExtensionError::InvalidSignature {
                    validator: address,
                    channel: "vote",
                }
            },
        )?;

        verify_signature(
            &validator.pub_key,
            &vote.non_rp_vote_extension,
            &vote.non_rp_extension_signature,
        )
        .map_err(|e| {
            warn!(validator = %to_hex(&address), error = %e, "[sv-03] bad non-RP signature");
            VoteExtensionError::InvalidSignature {
                validator: address,
                channel: "non-rp",
            }
        })?;

        let extension = decode_vote_extension(&vote.vote_extension)?;
        if extension.height() != params.height {
            return Err(VoteExtensionError::HeightMismatch {
                expected: params.height,
                actual: extension.height(),
            });
        }
        check_duplicate_votes(extension.side_tx_responses())?;

        signed_power = signed_power.saturating_add(validator.voting_power);
    }

    let total = params.validators.total_power();
    let required = supermajority_threshold(total);
    if signed_power < required {
        return Err(VoteExtensionError::InsufficientPower {
            signed: signed_power,
            total,
            required,
        });
    }

    debug!(
        height = params.height,
        signed_power, total, "[sv-03] extended commit validated"
    );
    Ok(())
}

/// A validator's own response list must not vote twice on one tx.
pub fn check_duplicate_votes(responses: &[SideTxResponse]) -> VoteExtensionResult<()> {
    let mut seen = HashSet::with_capacity(responses.len());
    for response in responses {
        if !seen.insert(response.tx_hash.as_slice()) {
            return Err(VoteExtensionError::DuplicateVote {
                tx_hash: response.tx_hash.clone(),
            });
        }
    }
    Ok(())
}
