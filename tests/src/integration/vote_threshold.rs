//! # Approval Threshold
//!
//! Three validators of power 10: a side tx needs `⌊2·30/3⌋ + 1 = 21` YES
//! power, so two YES votes (20) leave it skipped rather than approved.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use shared_types::{supermajority_threshold, tx_hash, Vote};
    use sv_03_vote_extension::decode_commit_info;
    use sv_04_vote_tally::tally_votes;
    use sv_05_checkpoint::{keeper, ChildChainClient};

    fn vote_no_from(target: usize) -> impl FnMut(usize, &mut shared_types::VoteExtension, &mut Vec<u8>) {
        move |validator, extension, _| {
            if validator == target {
                for response in &mut extension.consolidated_side_tx_response.side_tx_responses {
                    response.result = Vote::No;
                }
            }
        }
    }

    #[test]
    fn test_threshold_for_equal_powers() {
        let net = Network::new(3);
        assert_eq!(net.set.total_power(), 30);
        assert_eq!(supermajority_threshold(net.set.total_power()), 21);
    }

    #[test]
    fn test_two_of_three_yes_is_skipped() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 127).unwrap();
        let propose = checkpoint_tx(proposer, 0, 127, root_hash);

        net.run_height_with(vec![propose.clone()], vote_no_from(2))
            .unwrap();
        let h2 = net.run_height(vec![]).unwrap();

        // The commit carried 20 YES and 10 NO
        let commit = decode_commit_info(&h2.proposal[0]).unwrap();
        let outcome = tally_votes(&commit.votes, net.set.total_power()).unwrap();
        let hash = tx_hash(&propose).to_vec();
        assert!(!outcome.is_approved(&hash));
        assert!(outcome.skipped.contains(&hash));
        assert!(!outcome.rejected.contains(&hash));

        // So PreBlock never ran the post handler
        assert_eq!(
            net.agreed(|store| keeper::buffered_checkpoint(store).unwrap()),
            None
        );
    }

    #[test]
    fn test_unanimous_no_is_rejected() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 127).unwrap();
        let propose = checkpoint_tx(proposer, 0, 127, root_hash);

        net.run_height_with(vec![propose.clone()], |_, extension, _| {
            for response in &mut extension.consolidated_side_tx_response.side_tx_responses {
                response.result = Vote::No;
            }
        })
        .unwrap();
        let h2 = net.run_height(vec![]).unwrap();

        let commit = decode_commit_info(&h2.proposal[0]).unwrap();
        let outcome = tally_votes(&commit.votes, net.set.total_power()).unwrap();
        let hash = tx_hash(&propose).to_vec();
        assert_eq!(outcome.rejected, vec![hash]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(
            net.agreed(|store| keeper::buffered_checkpoint(store).unwrap()),
            None
        );
    }

    #[test]
    fn test_unanimous_yes_is_approved() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 127).unwrap();
        let propose = checkpoint_tx(proposer, 0, 127, root_hash);

        net.run_height(vec![propose.clone()]).unwrap();
        let h2 = net.run_height(vec![]).unwrap();

        let commit = decode_commit_info(&h2.proposal[0]).unwrap();
        let outcome = tally_votes(&commit.votes, net.set.total_power()).unwrap();
        assert!(outcome.is_approved(&tx_hash(&propose)));
        assert!(net
            .agreed(|store| keeper::buffered_checkpoint(store).unwrap())
            .is_some());
    }
}
