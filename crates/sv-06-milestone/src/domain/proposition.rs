//! Building and shape-checking milestone propositions.

use crate::domain::types::Params;
use crate::error::{MilestoneError, MilestoneResult};
use shared_types::MilestoneProposition;
use sv_05_checkpoint::ChildHeader;

const HASH_LEN: usize = 32;

/// Turn consecutive child headers into a proposition.
///
/// Stops at the first header that does not link to its predecessor; `None`
/// when `headers` is empty.
pub fn proposition_from_headers(headers: &[ChildHeader]) -> Option<MilestoneProposition> {
    let first = headers.first()?;
    let mut prop = MilestoneProposition {
        block_hashes: vec![first.hash.to_vec()],
        start_block_number: first.number,
        parent_hash: first.parent_hash.to_vec(),
        block_tds: vec![first.total_difficulty],
    };

    for pair in headers.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.number != prev.number + 1 || next.parent_hash != prev.hash {
            break;
        }
        prop.block_hashes.push(next.hash.to_vec());
        prop.block_tds.push(next.total_difficulty);
    }
    Some(prop)
}

/// Shape check run on every peer proposition at VerifyVoteExtension.
pub fn validate_proposition(prop: &MilestoneProposition, params: &Params) -> MilestoneResult<()> {
    let len = prop.block_hashes.len() as u64;
    if len == 0 {
        return Err(MilestoneError::invalid("no block hashes"));
    }
    if len > params.max_milestone_proposition_length {
        return Err(MilestoneError::invalid(format!(
            "{len} blocks exceeds the limit of {}",
            params.max_milestone_proposition_length
        )));
    }
    if prop.block_tds.len() != prop.block_hashes.len() {
        return Err(MilestoneError::invalid(format!(
            "{} total difficulties for {len} hashes",
            prop.block_tds.len()
        )));
    }
    if prop.parent_hash.len() != HASH_LEN
        || prop.block_hashes.iter().any(|h| h.len() != HASH_LEN)
    {
        return Err(MilestoneError::invalid("hash of wrong length"));
    }
    if prop.block_tds.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MilestoneError::invalid("total difficulty not increasing"));
    }
    if prop.start_block_number.checked_add(len).is_none() {
        return Err(MilestoneError::invalid("block range overflows"));
    }
    Ok(())
}
