//! Power-weighted vote accumulation.

use crate::error::{TallyError, TallyResult};
use shared_types::{
    supermajority_threshold, to_hex, Address, BlockIdFlag, ExtendedVoteInfo, Vote, VoteExtension,
};
use std::collections::{BTreeMap, HashSet};
use sv_03_vote_extension::decode_vote_extension;
use sv_telemetry::SIDE_TX_OUTCOMES;
use tracing::{debug, warn};

/// Per-transaction result sets, each sorted by tx hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyOutcome {
    pub approved: Vec<Vec<u8>>,
    pub rejected: Vec<Vec<u8>>,
    pub skipped: Vec<Vec<u8>>,
}

impl TallyOutcome {
    pub fn is_approved(&self, tx_hash: &[u8]) -> bool {
        self.approved
            .binary_search_by(|h| h.as_slice().cmp(tx_hash))
            .is_ok()
    }

    pub fn is_rejected(&self, tx_hash: &[u8]) -> bool {
        self.rejected
            .binary_search_by(|h| h.as_slice().cmp(tx_hash))
            .is_ok()
    }
}

/// Running totals keyed by `(tx_hash, vote)`.
#[derive(Debug, Clone)]
pub struct VoteTally {
    total_power: i64,
    /// Power per vote kind, indexed by `Vote as usize`.
    power: BTreeMap<Vec<u8>, [i64; 3]>,
    counted: HashSet<(Address, Vec<u8>)>,
}

impl VoteTally {
    pub fn new(total_power: i64) -> Self {
        Self {
            total_power,
            power: BTreeMap::new(),
            counted: HashSet::new(),
        }
    }

    pub fn threshold(&self) -> i64 {
        supermajority_threshold(self.total_power)
    }

    /// Add one validator's extension with the power it had when voting.
    ///
    /// Every first entry per tx hash is counted; on repeats the first
    /// duplicate is returned after the rest of the extension was processed.
    pub fn add_extension(
        &mut self,
        validator: Address,
        power: i64,
        extension: &VoteExtension,
    ) -> TallyResult<()> {
        let mut duplicate = None;

        for response in extension.side_tx_responses() {
            if !self.counted.insert((validator, response.tx_hash.clone())) {
                warn!(
                    validator = %to_hex(&validator),
                    tx_hash = %to_hex(&response.tx_hash),
                    "[sv-04] duplicate side-tx vote ignored"
                );
                duplicate.get_or_insert_with(|| TallyError::DuplicateVote {
                    validator,
                    tx_hash: response.tx_hash.clone(),
                });
                continue;
            }

            let entry = self
                .power
                .entry(response.tx_hash.clone())
                .or_insert([0; 3]);
            let slot = &mut entry[response.result as usize];
            *slot = slot.saturating_add(power);
        }

        match duplicate {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Accumulated power behind `vote` for `tx_hash`.
    pub fn power_for(&self, tx_hash: &[u8], vote: Vote) -> i64 {
        self.power
            .get(tx_hash)
            .map(|p| p[vote as usize])
            .unwrap_or(0)
    }

    /// Classify every voted transaction. `BTreeMap` order keeps the output
    /// sorted.
    pub fn outcome(&self) -> TallyOutcome {
        let threshold = self.threshold();
        let mut outcome = TallyOutcome::default();

        for (tx_hash, power) in &self.power {
            if power[Vote::Yes as usize] >= threshold {
                outcome.approved.push(tx_hash.clone());
            } else if power[Vote::No as usize] >= threshold {
                outcome.rejected.push(tx_hash.clone());
            } else {
                outcome.skipped.push(tx_hash.clone());
            }
        }
        outcome
    }
}

/// Tally an extended commit.
///
/// Stops at the first undecodable extension or duplicate vote.
pub fn tally_votes(votes: &[ExtendedVoteInfo], total_power: i64) -> TallyResult<TallyOutcome> {
    let mut tally = VoteTally::new(total_power);

    for vote in votes {
        if vote.block_id_flag != BlockIdFlag::Commit {
            continue;
        }
        let validator = vote.validator.address;
        let extension =
            decode_vote_extension(&vote.vote_extension).map_err(|e| TallyError::Decode {
                validator,
                reason: e.to_string(),
            })?;
        tally.add_extension(validator, vote.validator.power, &extension)?;
    }

    let outcome = tally.outcome();
    SIDE_TX_OUTCOMES
        .with_label_values(&["approved"])
        .inc_by(outcome.approved.len() as f64);
    SIDE_TX_OUTCOMES
        .with_label_values(&["rejected"])
        .inc_by(outcome.rejected.len() as f64);
    SIDE_TX_OUTCOMES
        .with_label_values(&["skipped"])
        .inc_by(outcome.skipped.len() as f64);
    debug!(
        approved = outcome.approved.len(),
        rejected = outcome.rejected.len(),
        skipped = outcome.skipped.len(),
        threshold = tally.threshold(),
        "[sv-04] side-tx tally complete"
    );
    Ok(outcome)
}
