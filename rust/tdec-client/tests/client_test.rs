use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tdec_client::{NodeLearner, NodeResponse, NodeTransport, ThresholdDecryptionClient, TransportError};

struct StubLearner {
    known: HashSet<String>,
    discovery_called: AtomicBool,
}

impl StubLearner {
    fn new(known: &[&str]) -> Self {
        Self { known: known.iter().map(|s| s.to_string()).collect(), discovery_called: AtomicBool::new(false) }
    }
}

#[async_trait]
impl NodeLearner for StubLearner {
    fn known_nodes(&self) -> HashSet<String> {
        self.known.clone()
    }

    async fn block_until_specific_nodes_are_known(
        &self,
        _unknown: HashSet<String>,
        _timeout: Duration,
        _allow_missing: usize,
    ) -> anyhow::Result<()> {
        self.discovery_called.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Responds 200 for nodes in `good`, 503 for the rest.
struct StubTransport {
    good: HashSet<String>,
}

#[async_trait]
impl NodeTransport for StubTransport {
    async fn send_decryption_request(
        &self,
        node: &str,
        request: &[u8],
        _timeout: Duration,
    ) -> Result<NodeResponse, TransportError> {
        if self.good.contains(node) {
            Ok(NodeResponse { status: 200, body: request.to_vec() })
        } else {
            Ok(NodeResponse { status: 503, body: vec![] })
        }
    }
}

fn requests_for(nodes: &[&str]) -> HashMap<String, Vec<u8>> {
    nodes.iter().map(|n| (n.to_string(), format!("req-for-{n}").into_bytes())).collect()
}

#[tokio::test]
async fn discovery_is_skipped_when_enough_nodes_are_already_known() {
    let learner = Arc::new(StubLearner::new(&["a", "b", "c"]));
    let transport = Arc::new(StubTransport { good: ["a", "b", "c"].into_iter().map(String::from).collect() });
    let client = ThresholdDecryptionClient::new(learner.clone(), transport);

    let (successes, failures) = client
        .gather_encrypted_decryption_shares(requests_for(&["a", "b", "c"]), 2, Duration::from_secs(5), Duration::from_millis(50))
        .await
        .unwrap();

    assert!(!learner.discovery_called.load(Ordering::SeqCst));
    assert_eq!(successes.len(), 2);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn discovery_blocks_when_not_enough_nodes_are_known() {
    let learner = Arc::new(StubLearner::new(&["a"]));
    let transport = Arc::new(StubTransport { good: ["a", "b"].into_iter().map(String::from).collect() });
    let client = ThresholdDecryptionClient::new(learner.clone(), transport);

    let (successes, _failures) = client
        .gather_encrypted_decryption_shares(requests_for(&["a", "b"]), 2, Duration::from_secs(5), Duration::from_millis(50))
        .await
        .unwrap();

    assert!(learner.discovery_called.load(Ordering::SeqCst));
    assert_eq!(successes.len(), 2);
}

#[tokio::test]
async fn non_200_responses_land_in_failures_not_errors() {
    let learner = Arc::new(StubLearner::new(&["a", "b", "c"]));
    let transport = Arc::new(StubTransport { good: ["a"].into_iter().map(String::from).collect() });
    let client = ThresholdDecryptionClient::new(learner, transport);

    let (successes, failures) = client
        .gather_encrypted_decryption_shares(
            requests_for(&["a", "b", "c"]),
            1,
            Duration::from_secs(5),
            Duration::from_millis(50),
        )
        .await
        .unwrap();

    assert_eq!(successes.len(), 1);
    assert!(successes.contains_key("a"));
    assert!(!failures.is_empty());
}

#[tokio::test]
async fn unreachable_target_returns_partial_successes_instead_of_erroring() {
    let learner = Arc::new(StubLearner::new(&["a", "b", "c"]));
    // Nobody answers 200: OutOfValues should surface as an empty success map, not an error.
    let transport = Arc::new(StubTransport { good: HashSet::new() });
    let client = ThresholdDecryptionClient::new(learner, transport);

    let (successes, failures) = client
        .gather_encrypted_decryption_shares(
            requests_for(&["a", "b", "c"]),
            3,
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await
        .unwrap();

    assert!(successes.is_empty());
    assert_eq!(failures.len(), 3);
}
