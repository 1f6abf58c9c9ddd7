//! # Node Runtime
//!
//! A single-validator node started from environment-style settings: the
//! payload producer keeps a payload ready for the height being proposed
//! and follows the chain as blocks commit.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_types::{RequestFinalizeBlock, RequestPrepareProposal};
    use std::collections::HashMap;
    use std::time::Duration;
    use sv_05_checkpoint::ChildChainClient;

    fn start() -> NodeRuntime {
        let vars: HashMap<&str, String> = [
            ("SV_CHAIN_ID", CHAIN_ID.to_string()),
            ("SV_BOR_CHAIN_ID", BOR_CHAIN_ID.to_string()),
            ("SV_VALIDATOR_KEY", "42".repeat(32)),
            ("SV_CHAIN_START_TIME", GENESIS_TIME.to_string()),
        ]
        .into_iter()
        .collect();
        let config = NodeConfig::from_lookup(|var| vars.get(var).cloned()).unwrap();
        config.validate().unwrap();
        NodeRuntime::start(config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_follows_committed_heights() {
        let node = start();
        let mut payloads = node.payloads();
        tokio::time::timeout(Duration::from_secs(5), payloads.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payloads.borrow_and_update().as_ref().unwrap().height, 1);

        let services = node.services().clone();
        let validator = services.validator_address();
        services.child_chain.extend(300, validator, 0);
        let root_hash = services.child_chain.get_root_hash(0, 99).unwrap();
        let tx = checkpoint_tx(validator, 0, 99, root_hash);

        let app = node.app();
        {
            let mut app = app.lock();
            let prepared = app
                .prepare_proposal(&RequestPrepareProposal {
                    max_tx_bytes: MAX_TX_BYTES,
                    txs: vec![tx.clone()],
                    height: 1,
                    time: GENESIS_TIME + 1,
                    proposer_address: validator,
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(prepared.txs, vec![tx]);
            assert!(!prepared.execution_payload.is_empty());

            let finalized = app
                .finalize_block(&RequestFinalizeBlock {
                    txs: prepared.txs,
                    hash: block_hash(1),
                    height: 1,
                    time: GENESIS_TIME + 1,
                    proposer_address: validator,
                    ..Default::default()
                })
                .unwrap();
            assert!(finalized.tx_results.iter().all(|r| r.code == 0));
            assert_eq!(app.commit().unwrap(), 1);
        }

        tokio::time::timeout(Duration::from_secs(5), payloads.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(app
            .lock()
            .payload()
            .and_then(|handle| handle.payload_for(2))
            .is_some());

        node.shutdown().await;
    }
}
