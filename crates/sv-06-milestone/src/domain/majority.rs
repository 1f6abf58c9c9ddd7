//! Supermajority agreement over milestone propositions.
//!
//! Every proposition backs each of its prefixes. The longest prefix whose
//! backing power reaches `⌊2·total/3⌋ + 1` wins. A validator backs exactly
//! one prefix per length, so at most one prefix per length can reach the
//! threshold.

use crate::domain::proposition::validate_proposition;
use crate::domain::types::Params;
use crate::error::{MilestoneError, MilestoneResult};
use shared_types::{
    supermajority_threshold, to_hex, Address, BlockIdFlag, ExtendedVoteInfo, MilestoneProposition,
    ValidatorSet,
};
use std::collections::BTreeMap;
use sv_03_vote_extension::decode_vote_extension;
use tracing::{debug, warn};

/// Prefix identity: start block, parent hash, hashes and tds of the prefix.
type PrefixKey = (u64, Vec<u8>, Vec<Vec<u8>>, Vec<u64>);

/// The run of blocks a supermajority agreed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorityMilestone {
    pub start_block: u64,
    pub end_block: u64,
    pub parent_hash: Vec<u8>,
    pub block_hashes: Vec<Vec<u8>>,
    /// Total difficulty at `end_block`.
    pub total_difficulty: u64,
    /// Backing validators in address order.
    pub supporters: Vec<Address>,
    pub power: i64,
}

impl MajorityMilestone {
    pub fn end_hash(&self) -> &[u8] {
        self.block_hashes.last().map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Default)]
struct Backing {
    power: i64,
    supporters: Vec<Address>,
}

/// Find the longest supermajority-backed prefix among the propositions of
/// `votes`, weighting each validator by its power in `set`.
///
/// Validators missing from `set`, votes without `Commit` and malformed
/// propositions are ignored. An undecodable extension is an error.
pub fn majority_proposition(
    votes: &[ExtendedVoteInfo],
    set: &ValidatorSet,
    params: &Params,
) -> MilestoneResult<Option<MajorityMilestone>> {
    let mut backing: BTreeMap<PrefixKey, Backing> = BTreeMap::new();

    for vote in votes {
        if vote.block_id_flag != BlockIdFlag::Commit {
            continue;
        }
        let validator = vote.validator.address;
        let Some(member) = set.get(&validator) else {
            debug!(validator = %to_hex(&validator), "[sv-06] vote from validator outside set");
            continue;
        };
        let extension =
            decode_vote_extension(&vote.vote_extension).map_err(|e| MilestoneError::Decode {
                validator,
                reason: e.to_string(),
            })?;
        let Some(prop) = extension.milestone_proposition else {
            continue;
        };
        if let Err(e) = validate_proposition(&prop, params) {
            warn!(validator = %to_hex(&validator), error = %e, "[sv-06] ignoring malformed proposition");
            continue;
        }

        for len in 1..=prop.block_hashes.len() {
            let entry = backing.entry(prefix_key(&prop, len)).or_default();
            entry.power = entry.power.saturating_add(member.voting_power);
            entry.supporters.push(validator);
        }
    }

    let threshold = supermajority_threshold(set.total_power());
    let mut best: Option<(PrefixKey, Backing)> = None;
    for (key, b) in backing {
        if b.power < threshold {
            continue;
        }
        let longer = match &best {
            Some((best_key, _)) => key.2.len() > best_key.2.len(),
            None => true,
        };
        if longer {
            best = Some((key, b));
        }
    }

    Ok(best.map(|((start, parent_hash, block_hashes, tds), mut b)| {
        b.supporters.sort();
        MajorityMilestone {
            start_block: start,
            end_block: start + block_hashes.len() as u64 - 1,
            parent_hash,
            block_hashes,
            total_difficulty: tds.last().copied().unwrap_or(0),
            supporters: b.supporters,
            power: b.power,
        }
    }))
}

fn prefix_key(prop: &MilestoneProposition, len: usize) -> PrefixKey {
    (
        prop.start_block_number,
        prop.parent_hash.clone(),
        prop.block_hashes[..len].to_vec(),
        prop.block_tds[..len].to_vec(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Validator, VoteExtension, VoteValidator};
    use sv_03_vote_extension::encode_vote_extension;

    fn set() -> ValidatorSet {
        ValidatorSet::new(vec![
            Validator::new([1; 20], vec![1; 33], 10),
            Validator::new([2; 20], vec![2; 33], 10),
            Validator::new([3; 20], vec![3; 33], 10),
        ])
    }

    fn prop(hashes: &[u8]) -> MilestoneProposition {
        MilestoneProposition {
            block_hashes: hashes.iter().map(|h| vec![*h; 32]).collect(),
            start_block_number: 50,
            parent_hash: vec![0; 32],
            block_tds: (1..=hashes.len() as u64).collect(),
        }
    }

    fn vote(id: u8, prop: Option<MilestoneProposition>) -> ExtendedVoteInfo {
        let extension = VoteExtension {
            milestone_proposition: prop,
            ..Default::default()
        };
        ExtendedVoteInfo {
            validator: VoteValidator {
                address: [id; 20],
                power: 10,
            },
            vote_extension: encode_vote_extension(&extension).unwrap(),
            extension_signature: vec![],
            non_rp_vote_extension: vec![],
            non_rp_extension_signature: vec![],
            block_id_flag: BlockIdFlag::Commit,
        }
    }

    #[test]
    fn test_longest_common_prefix_wins() {
        let votes = vec![
            vote(1, Some(prop(&[1, 2, 3]))),
            vote(2, Some(prop(&[1, 2, 3, 4]))),
            vote(3, Some(prop(&[1, 2, 9]))),
        ];

        let majority = majority_proposition(&votes, &set(), &Params::default())
            .unwrap()
            .unwrap();
        assert_eq!(majority.start_block, 50);
        assert_eq!(majority.end_block, 51);
        assert_eq!(majority.end_hash(), &[2u8; 32][..]);
        assert_eq!(majority.total_difficulty, 2);
        assert_eq!(majority.power, 30);
    }

    #[test]
    fn test_two_of_three_reaches_threshold() {
        let votes = vec![
            vote(1, Some(prop(&[1, 2]))),
            vote(2, Some(prop(&[1, 2]))),
            vote(3, None),
        ];
        // 20 of 30 is below ⌊60/3⌋ + 1 = 21.
        assert!(majority_proposition(&votes, &set(), &Params::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_absent_votes_and_strangers_ignored() {
        let mut absent = vote(3, Some(prop(&[1])));
        absent.block_id_flag = BlockIdFlag::Absent;
        let votes = vec![
            vote(1, Some(prop(&[1]))),
            vote(2, Some(prop(&[1]))),
            absent,
            vote(9, Some(prop(&[1]))),
        ];
        assert!(majority_proposition(&votes, &set(), &Params::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_undecodable_extension_is_error() {
        let mut bad = vote(1, None);
        bad.vote_extension = vec![0xff];
        assert!(majority_proposition(&[bad], &set(), &Params::default()).is_err());
    }
}
