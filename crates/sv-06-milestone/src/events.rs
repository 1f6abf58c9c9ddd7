//! Events emitted at PreBlock by milestone agreement and span rotation.

use crate::domain::{Milestone, Span};
use shared_types::{to_hex, Event};

pub const EVENT_MILESTONE: &str = "milestone";
pub const EVENT_SPAN: &str = "span";

pub fn milestone_event(milestone: &Milestone) -> Event {
    Event::new(EVENT_MILESTONE)
        .attr("number", milestone.number)
        .attr("milestone-id", &milestone.milestone_id)
        .attr("proposer", to_hex(&milestone.proposer))
        .attr("start-block", milestone.start_block)
        .attr("end-block", milestone.end_block)
        .attr("hash", to_hex(&milestone.hash))
        .attr("total-difficulty", milestone.total_difficulty)
}

/// `reason` is `span-end` or `stall`.
pub fn span_event(span: &Span, reason: &str) -> Event {
    Event::new(EVENT_SPAN)
        .attr("span-id", span.id)
        .attr("start-block", span.start_block)
        .attr("end-block", span.end_block)
        .attr("producer", to_hex(&span.producer))
        .attr("reason", reason)
}
