//! # Checkpoint and Milestone Flow
//!
//! A checkpoint travels through three heights of side-tx voting:
//!
//! 1. `MsgCheckpoint` is delivered at `h` and voted on in ExtendVote(h)
//! 2. PreBlock(h+1) buffers it
//! 3. `MsgCpAck` at `h+2` commits it in PreBlock(h+3)
//!
//! Milestones ride along in every vote extension.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use shared_types::Vote;
    use sv_03_vote_extension::{is_dummy_non_rp_extension, CHECKPOINT_NON_RP_PREFIX};
    use sv_05_checkpoint::events::{EVENT_CHECKPOINT, EVENT_CHECKPOINT_ACK};
    use sv_05_checkpoint::{keeper, Checkpoint, ChildChainClient, MsgCpAck, RootCheckpointEvent};
    use sv_06_milestone::keeper as milestone_keeper;

    fn buffered(net: &Network) -> Option<Checkpoint> {
        net.agreed(|store| keeper::buffered_checkpoint(store).unwrap())
    }

    #[test]
    fn test_checkpoint_buffered_acked_and_committed() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 255).unwrap();
        let propose = checkpoint_tx(proposer, 0, 255, root_hash);

        // h1: delivered and voted on, nothing buffered yet
        let h1 = net.run_height(vec![propose.clone()]).unwrap();
        assert_eq!(h1.code_of(&propose), Some(0));
        assert!(h1.verify_rejections.is_empty());
        for (extension, non_rp) in h1.extensions.iter().zip(&h1.non_rp) {
            assert_eq!(extension.side_tx_responses().len(), 1);
            assert_eq!(extension.side_tx_responses()[0].result, Vote::Yes);
            assert_eq!(non_rp[0], CHECKPOINT_NON_RP_PREFIX);
        }
        assert_eq!(buffered(&net), None);

        // h2: PreBlock buffers at the block time of h2
        let h2 = net.run_height(vec![]).unwrap();
        assert_eq!(h2.proposal.len(), 1);
        assert!(h2.finalized[0].events.iter().any(|e| e.kind == EVENT_CHECKPOINT));
        let checkpoint = buffered(&net).expect("checkpoint buffered");
        assert_eq!(
            (checkpoint.id, checkpoint.start_block, checkpoint.end_block),
            (1, 0, 255)
        );
        assert_eq!(checkpoint.root_hash, root_hash);
        assert_eq!(checkpoint.timestamp, h2.time);
        for non_rp in &h2.non_rp {
            assert!(is_dummy_non_rp_extension(non_rp, h2.height, CHAIN_ID));
        }

        // h3: the root chain confirms the submission
        let event_tx = [0x77; 32];
        net.root.insert_event(
            event_tx,
            3,
            RootCheckpointEvent {
                number: 1,
                proposer,
                start_block: 0,
                end_block: 255,
                root_hash,
            },
        );
        let relayer = net.peers[1].address();
        let ack = ack_tx(
            relayer,
            MsgCpAck {
                from: relayer,
                number: 1,
                proposer,
                start_block: 0,
                end_block: 255,
                root_hash,
                tx_hash: event_tx,
                log_index: 3,
            },
        );
        let h3 = net.run_height(vec![ack.clone()]).unwrap();
        assert_eq!(h3.code_of(&ack), Some(0));
        assert!(buffered(&net).is_some());

        // h4: committed, buffer cleared, proposer rotated
        let h4 = net.run_height(vec![]).unwrap();
        assert!(h4.finalized[0].events.iter().any(|e| e.kind == EVENT_CHECKPOINT_ACK));
        assert_eq!(buffered(&net), None);
        assert_eq!(net.agreed(|store| keeper::ack_count(store).unwrap()), 1);
        let committed = net
            .agreed(|store| keeper::last_checkpoint(store).unwrap())
            .expect("checkpoint committed");
        assert_eq!((committed.id, committed.end_block), (1, 255));
        assert_eq!(committed.timestamp, h4.time);
        assert_eq!(net.agreed(|store| keeper::next_start_block(store).unwrap()), 256);
        assert_ne!(net.checkpoint_proposer(), proposer);
    }

    #[test]
    fn test_next_checkpoint_must_continue() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let gap_root = net.child.get_root_hash(10, 20).unwrap();
        let gap = checkpoint_tx(proposer, 10, 20, gap_root);

        // Rejected by the msg route during the proposer's dry run
        let result = net.run_height(vec![gap.clone()]);
        assert!(matches!(result, Err(HeightError::Prepare(_))));
        assert!(net
            .process_everywhere(vec![gap])
            .iter()
            .all(|s| *s == shared_types::ProposalStatus::Reject));
    }

    #[test]
    fn test_wrong_root_hash_is_voted_down() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let forged = checkpoint_tx(proposer, 0, 99, [0xab; 32]);

        let h1 = net.run_height(vec![forged.clone()]).unwrap();
        assert_eq!(h1.code_of(&forged), Some(0));
        for (extension, non_rp) in h1.extensions.iter().zip(&h1.non_rp) {
            assert_eq!(extension.side_tx_responses()[0].result, Vote::No);
            assert!(is_dummy_non_rp_extension(non_rp, h1.height, CHAIN_ID));
        }

        net.run_height(vec![]).unwrap();
        assert_eq!(buffered(&net), None);
    }

    #[test]
    fn test_milestones_follow_child_chain() {
        let mut net = Network::new(3);
        net.extend_child_chain(40);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 15).unwrap();

        let h1 = net
            .run_height(vec![checkpoint_tx(proposer, 0, 15, root_hash)])
            .unwrap();
        assert!(h1
            .extensions
            .iter()
            .all(|e| e.milestone_proposition.is_some()));

        // PreBlock(2) commits what every validator proposed at h1
        net.run_height(vec![]).unwrap();
        let first = net
            .agreed(|store| milestone_keeper::last_milestone(store).unwrap())
            .expect("first milestone");
        assert_eq!(first.number, 1);
        assert_eq!(first.start_block, 0);

        // h2 proposed the same range again; only h3 extends past it
        net.run_height(vec![]).unwrap();
        net.run_height(vec![]).unwrap();
        let second = net
            .agreed(|store| milestone_keeper::last_milestone(store).unwrap())
            .expect("second milestone");
        assert_eq!(second.number, 2);
        assert_eq!(second.start_block, first.end_block + 1);
        assert_eq!(
            net.agreed(|store| milestone_keeper::milestone_count(store).unwrap()),
            2
        );
    }
}
