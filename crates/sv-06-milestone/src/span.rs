//! Producer span rotation rules.

use crate::domain::{Params, Span};
use shared_types::{Address, ValidatorSet};

/// The validator after `current` in address order, wrapping around.
///
/// Falls back to the first validator when `current` left the set.
pub fn next_producer(set: &ValidatorSet, current: &Address) -> Option<Address> {
    let validators = set.validators();
    validators
        .iter()
        .find(|v| v.address > *current)
        .or_else(|| validators.first())
        .map(|v| v.address)
}

/// Whether a milestone ending at `milestone_end` is close enough to the end
/// of `span` to schedule the next one.
pub fn needs_next_span(span: &Span, milestone_end: u64, params: &Params) -> bool {
    milestone_end.saturating_add(params.span_buffer) >= span.end_block
}

/// Whether the producer made no progress for too long.
///
/// `last_progress` is the later of the last milestone height and the last
/// stall rotation.
pub fn is_stalled(height: i64, last_progress: i64, params: &Params) -> bool {
    height.saturating_sub(last_progress) > params.producer_stall_threshold as i64
}

/// Span following `previous`, starting at `start_block`.
pub fn successor_span(previous: &Span, start_block: u64, producer: Address, params: &Params) -> Span {
    Span {
        id: previous.id + 1,
        start_block,
        end_block: start_block + params.span_length.max(1) - 1,
        producer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Validator;

    fn set() -> ValidatorSet {
        ValidatorSet::new(vec![
            Validator::new([1; 20], vec![1; 33], 10),
            Validator::new([2; 20], vec![2; 33], 10),
            Validator::new([3; 20], vec![3; 33], 10),
        ])
    }

    #[test]
    fn test_next_producer_wraps() {
        assert_eq!(next_producer(&set(), &[1; 20]), Some([2; 20]));
        assert_eq!(next_producer(&set(), &[3; 20]), Some([1; 20]));
        assert_eq!(next_producer(&set(), &[9; 20]), Some([1; 20]));
        assert_eq!(next_producer(&ValidatorSet::new(vec![]), &[1; 20]), None);
    }

    #[test]
    fn test_span_end_and_stall_rules() {
        let params = Params {
            span_buffer: 10,
            producer_stall_threshold: 5,
            ..Params::default()
        };
        let span = Span {
            id: 1,
            start_block: 0,
            end_block: 99,
            producer: [1; 20],
        };

        assert!(!needs_next_span(&span, 88, &params));
        assert!(needs_next_span(&span, 89, &params));

        assert!(!is_stalled(15, 10, &params));
        assert!(is_stalled(16, 10, &params));
    }

    #[test]
    fn test_successor_span() {
        let span = Span {
            id: 4,
            start_block: 0,
            end_block: 99,
            producer: [1; 20],
        };
        let next = successor_span(&span, 100, [2; 20], &Params::default());
        assert_eq!(next.id, 5);
        assert_eq!(next.end_block, 6_499);
    }
}
