//! Validator set and weighted proposer rotation.
//!
//! The staking module owns validator bookkeeping; subsystems here only read
//! a snapshot of the set at a given height.

use crate::entities::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A bonded validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Signer / consensus address.
    pub address: Address,
    /// Compressed secp256k1 consensus public key (33 bytes).
    pub pub_key: Vec<u8>,
    pub voting_power: i64,
}

impl Validator {
    pub fn new(address: Address, pub_key: Vec<u8>, voting_power: i64) -> Self {
        Self {
            address,
            pub_key,
            voting_power,
        }
    }
}

/// Snapshot of the validator set, ordered by address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    total_power: i64,
    #[serde(skip)]
    lookup: HashMap<Address, usize>,
}

impl ValidatorSet {
    /// Build a set; validators are sorted by address and zero-power entries
    /// are dropped.
    pub fn new(mut validators: Vec<Validator>) -> Self {
        validators.retain(|v| v.voting_power > 0);
        validators.sort_by(|a, b| a.address.cmp(&b.address));
        validators.dedup_by(|a, b| a.address == b.address);
        let total_power = validators
            .iter()
            .fold(0i64, |acc, v| acc.saturating_add(v.voting_power));
        let lookup = validators
            .iter()
            .enumerate()
            .map(|(i, v)| (v.address, i))
            .collect();
        Self {
            validators,
            total_power,
            lookup,
        }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn total_power(&self) -> i64 {
        self.total_power
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.lookup.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&Validator> {
        self.lookup.get(address).map(|&idx| &self.validators[idx])
    }

    /// Rebuild the lookup table (after deserialization).
    pub fn rebuild_lookup(&mut self) {
        self.lookup = self
            .validators
            .iter()
            .enumerate()
            .map(|(i, v)| (v.address, i))
            .collect();
    }
}

/// Supermajority threshold: `⌊2·total/3⌋ + 1`.
pub fn supermajority_threshold(total_power: i64) -> i64 {
    (total_power.saturating_mul(2) / 3).saturating_add(1)
}

/// Deterministic weighted round-robin over a validator set.
///
/// Each step adds every validator's power to its priority, selects the
/// highest priority (lowest address on ties) and subtracts the total power
/// from the selected one. The state survives across blocks so the cursor
/// only moves when a step is taken explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerRotation {
    priorities: BTreeMap<Address, i64>,
    proposer: Option<Address>,
}

impl ProposerRotation {
    /// Fresh rotation with all priorities at zero and the first proposer
    /// already selected.
    pub fn new(set: &ValidatorSet) -> Self {
        let mut rotation = Self::default();
        rotation.advance(set, 1);
        rotation
    }

    /// Currently selected proposer.
    pub fn proposer(&self) -> Option<Address> {
        self.proposer
    }

    /// Take `steps` selection steps, returning the resulting proposer.
    pub fn advance(&mut self, set: &ValidatorSet, steps: u64) -> Option<Address> {
        if set.is_empty() {
            return self.proposer;
        }
        self.sync(set);
        for _ in 0..steps {
            self.proposer = Some(self.step(set));
        }
        self.proposer
    }

    /// Proposer after `steps` more steps, without moving the cursor.
    pub fn peek(&self, set: &ValidatorSet, steps: u64) -> Option<Address> {
        if steps == 0 {
            return self.proposer;
        }
        self.clone().advance(set, steps)
    }

    /// Track joins and leaves: new validators start at zero priority.
    fn sync(&mut self, set: &ValidatorSet) {
        self.priorities.retain(|addr, _| set.contains(addr));
        for v in set.validators() {
            self.priorities.entry(v.address).or_insert(0);
        }
        if let Some(p) = self.proposer {
            if !set.contains(&p) {
                self.proposer = None;
            }
        }
    }

    fn step(&mut self, set: &ValidatorSet) -> Address {
        for v in set.validators() {
            if let Some(p) = self.priorities.get_mut(&v.address) {
                *p = p.saturating_add(v.voting_power);
            }
        }

        // BTreeMap iterates in address order, so `>` keeps the lowest address
        // among equal priorities.
        let mut best: Option<(Address, i64)> = None;
        for (addr, p) in self.priorities.iter() {
            match best {
                Some((_, best_p)) if *p <= best_p => {}
                _ => best = Some((*addr, *p)),
            }
        }

        let (best_addr, _) = best.unwrap_or((set.validators()[0].address, 0));
        if let Some(p) = self.priorities.get_mut(&best_addr) {
            *p = p.saturating_sub(set.total_power());
        }
        best_addr
    }
}
