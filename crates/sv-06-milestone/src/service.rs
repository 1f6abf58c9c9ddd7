//! Milestone service driven by the proposal lifecycle.

use crate::domain::{
    majority_proposition, proposition_from_headers, validate_proposition, MajorityMilestone,
    Milestone, Params, Span,
};
use crate::error::MilestoneResult;
use crate::events;
use crate::keeper;
use crate::span::{is_stalled, needs_next_span, next_producer, successor_span};
use shared_types::{to_hex, ExtendedVoteInfo, MilestoneProposition, Validator, ValidatorSet};
use std::sync::Arc;
use sv_01_state_store::{Context, KvStore};
use sv_05_checkpoint::{ChildChainClient, ChildHeader};
use sv_telemetry::{metric_inc, MILESTONES_COMMITTED};
use tracing::{debug, info, warn};

/// What PreBlock changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneOutcome {
    pub committed: Option<Milestone>,
    pub spans_added: Vec<Span>,
}

pub struct MilestoneService {
    child: Arc<dyn ChildChainClient>,
}

impl MilestoneService {
    pub fn new(child: Arc<dyn ChildChainClient>) -> Self {
        Self { child }
    }

    /// First child block the next milestone must start at or after.
    fn expected_start(store: &dyn KvStore) -> MilestoneResult<(u64, Option<Milestone>)> {
        let last = keeper::last_milestone(store)?;
        let start = last.as_ref().map(|m| m.end_block + 1).unwrap_or(0);
        Ok((start, last))
    }

    /// Proposition this validator attaches to its vote extension.
    ///
    /// When the child chain is more than `ff_milestone_threshold` blocks
    /// ahead, the proposition jumps to an interval-aligned start so every
    /// validator picks the same one.
    pub fn propose(&self, store: &dyn KvStore) -> MilestoneResult<Option<MilestoneProposition>> {
        let params = keeper::params(store)?;
        let (expected, last) = Self::expected_start(store)?;

        let mut start = expected;
        if self
            .child
            .check_blocks_exist(expected.saturating_add(params.ff_milestone_threshold))?
        {
            let target = expected + params.ff_milestone_threshold;
            let interval = params.ff_milestone_block_interval.max(1);
            start = (target - target % interval).max(expected);
            debug!(from = expected, to = start, "[sv-06] fast-forwarding milestone proposition");
        }

        let mut headers = self
            .child
            .get_headers(start, params.max_milestone_proposition_length)?;
        if let (Some(last), Some(first)) = (&last, headers.first()) {
            if start == expected && first.parent_hash.as_slice() != last.hash.as_slice() {
                warn!(
                    block = first.number,
                    "[sv-06] child chain diverged from last milestone, not proposing"
                );
                return Ok(None);
            }
        }
        self.truncate_at_foreign_author(store, &mut headers)?;

        Ok(proposition_from_headers(&headers))
    }

    /// Cut `headers` at the first block not authored by its span producer.
    fn truncate_at_foreign_author(
        &self,
        store: &dyn KvStore,
        headers: &mut Vec<ChildHeader>,
    ) -> MilestoneResult<()> {
        for (i, header) in headers.iter().enumerate() {
            let Some(span) = keeper::span_for_block(store, header.number)? else {
                continue;
            };
            let author = self.child.get_block_author(header.number)?;
            if author != span.producer {
                debug!(
                    block = header.number,
                    author = %to_hex(&author),
                    "[sv-06] block not authored by span producer"
                );
                headers.truncate(i);
                break;
            }
        }
        Ok(())
    }

    /// Shape check for a peer's proposition.
    pub fn validate(&self, store: &dyn KvStore, prop: &MilestoneProposition) -> MilestoneResult<()> {
        validate_proposition(prop, &keeper::params(store)?)
    }

    /// PreBlock step: commit the supermajority milestone of `votes` (weighted
    /// by `set`, the validator set of the height that produced them) and
    /// apply the span rules.
    pub fn apply_majority(
        &self,
        ctx: &mut Context<'_>,
        votes: &[ExtendedVoteInfo],
        set: &ValidatorSet,
    ) -> MilestoneResult<MilestoneOutcome> {
        let params = keeper::params(ctx.store())?;
        let mut outcome = MilestoneOutcome::default();

        if let Some(majority) = majority_proposition(votes, set, &params)? {
            outcome.committed = self.commit(ctx, &majority, set, &params)?;
        }

        if let Some(milestone) = &outcome.committed {
            if let Some(span) = keeper::latest_span(ctx.store())? {
                if needs_next_span(&span, milestone.end_block, &params) {
                    if let Some(producer) = next_producer(set, &span.producer) {
                        let next = successor_span(&span, span.end_block + 1, producer, &params);
                        self.add_span(ctx, &next, "span-end")?;
                        outcome.spans_added.push(next);
                    }
                }
            }
        } else if let Some(span) = self.rotate_if_stalled(ctx, set, &params)? {
            outcome.spans_added.push(span);
        }

        Ok(outcome)
    }

    fn commit(
        &self,
        ctx: &mut Context<'_>,
        majority: &MajorityMilestone,
        set: &ValidatorSet,
        params: &Params,
    ) -> MilestoneResult<Option<Milestone>> {
        let (expected, last) = Self::expected_start(ctx.store())?;
        if majority.start_block < expected {
            debug!(
                start = majority.start_block,
                expected, "[sv-06] majority proposition already covered"
            );
            return Ok(None);
        }
        if let Some(last) = &last {
            if majority.start_block == expected && majority.parent_hash != last.hash {
                warn!(
                    start = majority.start_block,
                    "[sv-06] majority proposition does not extend last milestone"
                );
                return Ok(None);
            }
        }

        // Heaviest supporter; supporters are address-sorted so `>=` keeps the
        // lowest address on ties.
        let proposer = majority
            .supporters
            .iter()
            .filter_map(|addr| set.get(addr))
            .fold(None, |best: Option<&Validator>, v| match best {
                Some(b) if b.voting_power >= v.voting_power => Some(b),
                _ => Some(v),
            })
            .map(|v| v.address);
        let Some(proposer) = proposer else {
            return Ok(None);
        };

        let number = keeper::milestone_count(ctx.store())? + 1;
        let milestone = Milestone {
            number,
            milestone_id: format!("{}-{}", majority.end_block, to_hex(majority.end_hash())),
            proposer,
            start_block: majority.start_block,
            end_block: majority.end_block,
            hash: majority.end_hash().to_vec(),
            total_difficulty: majority.total_difficulty,
            bor_chain_id: params.bor_chain_id.clone(),
            timestamp: ctx.block_time(),
        };
        let height = ctx.height();
        keeper::add_milestone(ctx.store_mut(), &milestone)?;
        keeper::set_last_milestone_height(ctx.store_mut(), height)?;

        metric_inc!(MILESTONES_COMMITTED);
        info!(
            number,
            start_block = milestone.start_block,
            end_block = milestone.end_block,
            power = majority.power,
            "[sv-06] milestone committed"
        );
        ctx.emit(events::milestone_event(&milestone));
        Ok(Some(milestone))
    }

    fn rotate_if_stalled(
        &self,
        ctx: &mut Context<'_>,
        set: &ValidatorSet,
        params: &Params,
    ) -> MilestoneResult<Option<Span>> {
        let store = ctx.store();
        let Some(latest) = keeper::latest_span(store)? else {
            return Ok(None);
        };
        let last_progress =
            keeper::last_milestone_height(store)?.max(keeper::last_rotation_height(store)?);
        if !is_stalled(ctx.height(), last_progress, params) {
            return Ok(None);
        }

        let (start, _) = Self::expected_start(store)?;
        let stalled = keeper::span_for_block(store, start)?.unwrap_or_else(|| latest.clone());
        let Some(producer) = next_producer(set, &stalled.producer) else {
            return Ok(None);
        };

        let span = successor_span(&latest, start, producer, params);
        warn!(
            stalled_producer = %to_hex(&stalled.producer),
            new_producer = %to_hex(&producer),
            start_block = start,
            "[sv-06] producer stalled, rotating span"
        );
        let height = ctx.height();
        keeper::set_last_rotation_height(ctx.store_mut(), height)?;
        self.add_span(ctx, &span, "stall")?;
        Ok(Some(span))
    }

    fn add_span(&self, ctx: &mut Context<'_>, span: &Span, reason: &str) -> MilestoneResult<()> {
        keeper::add_span(ctx.store_mut(), span)?;
        info!(
            id = span.id,
            start_block = span.start_block,
            end_block = span.end_block,
            reason,
            "[sv-06] span added"
        );
        ctx.emit(events::span_event(span, reason));
        Ok(())
    }
}
