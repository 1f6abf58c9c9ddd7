//! # Vote Extension Integrity
//!
//! Extensions that were altered after signing, vote twice on one tx or
//! carry a forged non-RP payload must not reach PreBlock.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use shared_types::{Msg, ProposalStatus, SideTxResponse, Tx, Vote};
    use sv_03_vote_extension::{decode_vote_extension, encode_vote_extension, CHECKPOINT_NON_RP_PREFIX};
    use sv_05_checkpoint::adapters::InMemoryChildChain;
    use sv_05_checkpoint::{
        checkpoint_sign_bytes, keeper, ChildChainClient, MsgCheckpoint, MSG_CHECKPOINT,
    };

    fn all_reject(statuses: &[ProposalStatus]) -> bool {
        statuses.iter().all(|s| *s == ProposalStatus::Reject)
    }

    /// Network one height in, with a checkpoint voted on at h1.
    fn voted_network() -> (Network, Vec<u8>) {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 63).unwrap();
        let propose = checkpoint_tx(proposer, 0, 63, root_hash);
        net.run_height(vec![propose.clone()]).unwrap();
        (net, propose)
    }

    #[test]
    fn test_extension_changed_after_signing() {
        let (mut net, _) = voted_network();

        let vote = &mut net.last_commit_mut().votes[0];
        let mut extension = decode_vote_extension(&vote.vote_extension).unwrap();
        extension.consolidated_side_tx_response.side_tx_responses[0].result = Vote::No;
        vote.vote_extension = encode_vote_extension(&extension).unwrap();

        let proposal = vec![net.encoded_last_commit()];
        assert!(all_reject(&net.process_everywhere(proposal)));
        assert!(matches!(
            net.run_height(vec![]),
            Err(HeightError::Rejected { validator: 0 })
        ));
        assert_eq!(
            net.agreed(|store| keeper::buffered_checkpoint(store).unwrap()),
            None
        );
    }

    #[test]
    fn test_commit_without_supermajority() {
        let (mut net, _) = voted_network();
        net.last_commit_mut().votes.truncate(2);

        let proposal = vec![net.encoded_last_commit()];
        assert!(all_reject(&net.process_everywhere(proposal)));
    }

    #[test]
    fn test_missing_commit_rejected() {
        let (mut net, propose) = voted_network();
        assert!(all_reject(&net.process_everywhere(vec![])));
        assert!(all_reject(&net.process_everywhere(vec![vec![0xde, 0xad]])));
        assert!(all_reject(&net.process_everywhere(vec![propose])));
    }

    #[test]
    fn test_duplicate_votes_rejected_by_peers() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 63).unwrap();
        let propose = checkpoint_tx(proposer, 0, 63, root_hash);

        let h1 = net
            .run_height_with(vec![propose], |validator, extension, _| {
                if validator == 2 {
                    let responses = &mut extension.consolidated_side_tx_response.side_tx_responses;
                    let first: SideTxResponse = responses[0].clone();
                    responses.push(first);
                }
            })
            .unwrap();

        let mut rejections = h1.verify_rejections.clone();
        rejections.sort_unstable();
        assert_eq!(rejections, vec![(0, 2), (1, 2)]);

        // The remaining 20 power is short of the threshold at h2
        assert!(matches!(
            net.run_height(vec![]),
            Err(HeightError::Rejected { .. })
        ));
    }

    #[test]
    fn test_forged_non_rp_rejected_by_peers() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 63).unwrap();
        let propose = checkpoint_tx(proposer, 0, 63, root_hash);

        let forged = MsgCheckpoint {
            proposer,
            start_block: 0,
            end_block: 63,
            root_hash: [0xee; 32],
            bor_chain_id: BOR_CHAIN_ID.to_string(),
        };
        let mut forged_bytes = vec![CHECKPOINT_NON_RP_PREFIX];
        forged_bytes.extend_from_slice(&checkpoint_sign_bytes(&forged));

        let h1 = net
            .run_height_with(vec![propose], |validator, _, non_rp| {
                if validator == 1 {
                    *non_rp = forged_bytes.clone();
                }
            })
            .unwrap();

        let mut rejections = h1.verify_rejections.clone();
        rejections.sort_unstable();
        assert_eq!(rejections, vec![(0, 1), (2, 1)]);
    }

    #[test]
    fn test_non_rp_tolerated_while_child_chain_offline() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 63).unwrap();
        let propose = checkpoint_tx(proposer, 0, 63, root_hash);
        net.run_height(vec![propose]).unwrap();

        // ProcessProposal cannot verify the non-RP payloads but still accepts
        net.child.set_unavailable(true);
        let statuses = net.process_everywhere(vec![net.encoded_last_commit()]);
        assert!(statuses.iter().all(|s| *s == ProposalStatus::Accept));
    }

    #[test]
    fn test_non_rp_from_validator_ahead_of_child_chain() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 63).unwrap();
        let propose = checkpoint_tx(proposer, 0, 63, root_hash);

        // Validator 1 already sees child blocks the others have not synced.
        let ahead = InMemoryChildChain::new();
        ahead.extend(500, net.set.validators()[0].address, 0);
        let signed = MsgCheckpoint {
            proposer,
            start_block: 0,
            end_block: 499,
            root_hash: ahead.get_root_hash(0, 499).unwrap(),
            bor_chain_id: BOR_CHAIN_ID.to_string(),
        };
        let mut non_rp_bytes = vec![CHECKPOINT_NON_RP_PREFIX];
        non_rp_bytes.extend_from_slice(&checkpoint_sign_bytes(&signed));

        let h1 = net
            .run_height_with(vec![propose], |validator, _, non_rp| {
                if validator == 1 {
                    *non_rp = non_rp_bytes.clone();
                }
            })
            .unwrap();
        assert!(h1.verify_rejections.is_empty());

        let statuses = net.process_everywhere(vec![net.encoded_last_commit()]);
        assert!(statuses.iter().all(|s| *s == ProposalStatus::Accept));

        // Once synced the payload verifies and the chain moves on
        net.extend_child_chain(200);
        net.run_height(vec![]).unwrap();
        assert!(net
            .agreed(|store| keeper::buffered_checkpoint(store).unwrap())
            .is_some());
    }

    #[test]
    fn test_two_side_messages_in_one_tx() {
        let mut net = Network::new(3);
        net.extend_child_chain(300);
        let proposer = net.checkpoint_proposer();
        let root_hash = net.child.get_root_hash(0, 63).unwrap();
        let msg = MsgCheckpoint {
            proposer,
            start_block: 0,
            end_block: 63,
            root_hash,
            bor_chain_id: BOR_CHAIN_ID.to_string(),
        };
        let packed = Msg::pack(MSG_CHECKPOINT, &msg).unwrap();
        let double = Tx::new(vec![packed.clone(), packed], proposer, 0)
            .encode()
            .unwrap();

        assert!(matches!(
            net.run_height(vec![double.clone()]),
            Err(HeightError::Prepare(_))
        ));
        assert!(all_reject(&net.process_everywhere(vec![double])));
    }
}
