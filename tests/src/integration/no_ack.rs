//! # No-Ack Rotation
//!
//! When no checkpoint lands for longer than the buffer time, the validator
//! `⌊elapsed / buffer_time⌋` steps ahead in the rotation may send a no-ack
//! that moves the checkpoint proposer on by one. At most one no-ack is
//! accepted per buffer window.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use shared_types::ProposalStatus;
    use sv_05_checkpoint::events::EVENT_CHECKPOINT_NO_ACK;
    use sv_05_checkpoint::{keeper, ChildChainClient};

    fn all_reject(statuses: &[ProposalStatus]) -> bool {
        statuses.iter().all(|s| *s == ProposalStatus::Reject)
    }

    /// Network past its first height, with the three rotation positions.
    fn started() -> (Network, [shared_types::Address; 3]) {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let current = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 31).unwrap();
        net.run_height(vec![checkpoint_tx(current, 0, 31, root_hash)])
            .unwrap();

        let next = net.proposer_after(1);
        let outsider = net
            .peers
            .iter()
            .map(Peer::address)
            .find(|a| *a != current && *a != next)
            .expect("three distinct validators");
        (net, [current, next, outsider])
    }

    #[test]
    fn test_no_ack_inside_buffer_window() {
        let (mut net, [_, next, _]) = started();
        let early = no_ack_tx(next, 1);

        let proposal = vec![net.encoded_last_commit(), early.clone()];
        assert!(all_reject(&net.process_everywhere(proposal)));

        let h2 = net.run_height(vec![early]).unwrap();
        assert_eq!(h2.proposal.len(), 1);
        assert_eq!(net.agreed(|store| keeper::last_no_ack(store).unwrap()), 0);
    }

    #[test]
    fn test_no_ack_rotation() {
        let (mut net, [current, next, outsider]) = started();
        net.advance_time(BUFFER_TIME + 50);

        // Out of turn after the window
        let wrong = no_ack_tx(outsider, 1);
        let proposal = vec![net.encoded_last_commit(), wrong];
        assert!(all_reject(&net.process_everywhere(proposal)));

        // The next proposer in rotation
        let accepted = no_ack_tx(next, 2);
        let h2 = net.run_height(vec![accepted.clone()]).unwrap();
        assert_eq!(h2.code_of(&accepted), Some(0));
        let index = h2.index_of(&accepted).unwrap();
        assert!(h2.finalized[0].tx_results[index]
            .events
            .iter()
            .any(|e| e.kind == EVENT_CHECKPOINT_NO_ACK));

        assert_eq!(
            net.agreed(|store| keeper::last_no_ack(store).unwrap()),
            h2.time
        );
        assert_eq!(net.checkpoint_proposer(), next);
        assert_ne!(net.checkpoint_proposer(), current);
    }

    #[test]
    fn test_one_no_ack_per_window() {
        let (mut net, [_, next, _]) = started();
        net.advance_time(BUFFER_TIME + 50);
        net.run_height(vec![no_ack_tx(next, 1)]).unwrap();

        let again = no_ack_tx(net.proposer_after(1), 2);
        let proposal = vec![net.encoded_last_commit(), again];
        assert!(all_reject(&net.process_everywhere(proposal)));

        // A full window later the rotation continues
        net.advance_time(BUFFER_TIME + 1);
        let expected = net.proposer_after(2);
        let later = no_ack_tx(expected, 3);
        let h = net.run_height(vec![later.clone()]).unwrap();
        assert_eq!(h.code_of(&later), Some(0));
    }
}
