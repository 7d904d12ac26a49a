use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tdec_pool::{BatchValueFactory, Pool, PoolError, WorkerFn};

use crate::error::ClientError;
use crate::learner::NodeLearner;
use crate::transport::NodeTransport;

/// Default overall deadline and inter-batch stagger, matching
/// `ThresholdDecryptionClient.DEFAULT_DECRYPTION_TIMEOUT`/
/// `DEFAULT_STAGGER_TIMEOUT` in the reference.
pub const DEFAULT_DECRYPTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STAGGER_TIMEOUT: Duration = Duration::from_secs(3);

/// A thin, opinionated user of [`tdec_pool::Pool`]: fans an encrypted
/// threshold-decryption request across a shuffled set of nodes and
/// returns as soon as `threshold` of them answer, a deadline expires, or
/// the candidate set is exhausted.
pub struct ThresholdDecryptionClient {
    learner: Arc<dyn NodeLearner>,
    transport: Arc<dyn NodeTransport>,
}

impl ThresholdDecryptionClient {
    pub fn new(learner: Arc<dyn NodeLearner>, transport: Arc<dyn NodeTransport>) -> Self {
        Self { learner, transport }
    }

    pub async fn gather_encrypted_decryption_shares(
        &self,
        encrypted_requests: HashMap<String, Vec<u8>>,
        threshold: usize,
        timeout: Duration,
        stagger_timeout: Duration,
    ) -> Result<(HashMap<String, Vec<u8>>, HashMap<String, String>), ClientError> {
        let requested: HashSet<String> = encrypted_requests.keys().cloned().collect();
        self.ensure_node_availability(&requested, threshold, timeout).await?;

        let mut node_ids: Vec<String> = requested.into_iter().collect();
        node_ids.shuffle(&mut rand::thread_rng());

        let batch_size = ceil_multiply(threshold, 1.25);
        let concurrency = ceil_multiply(threshold, 1.5);

        let requests = Arc::new(encrypted_requests);
        let transport = Arc::clone(&self.transport);
        let worker: WorkerFn<String, Vec<u8>> = Arc::new(move |node: String| {
            let requests = Arc::clone(&requests);
            let transport = Arc::clone(&transport);
            Box::pin(async move {
                let body = requests
                    .get(&node)
                    .ok_or_else(|| anyhow::anyhow!("no prepared request for node {node}"))?;
                let response = transport
                    .send_decryption_request(&node, body, timeout)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
                if response.status != 200 {
                    anyhow::bail!("node {node} returned status {}", response.status);
                }
                Ok(response.body)
            })
        });

        let factory = BatchValueFactory::new(node_ids, threshold, Some(batch_size))?;
        let pool = Pool::new(worker, Box::new(factory), threshold, timeout, stagger_timeout, Some(concurrency));
        pool.start().await;

        let result = match pool.block_until_target_successes().await {
            Ok(successes) => Ok(successes),
            Err(PoolError::TimedOut { .. }) | Err(PoolError::OutOfValues { .. }) => Ok(pool.get_successes()),
            Err(PoolError::ProducerError(e)) => Err(ClientError::Producer(e.to_string())),
        };

        pool.cancel();
        let _ = pool.join().await;

        let successes = result?;
        let failures = pool.get_failures().into_iter().map(|(node, f)| (node, f.to_string())).collect();
        Ok((successes, failures))
    }

    /// Step 1 of the dataflow: ensure the learner already knows at least
    /// `threshold` of the requested nodes, blocking on discovery for the
    /// rest otherwise.
    async fn ensure_node_availability(
        &self,
        requested: &HashSet<String>,
        threshold: usize,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        let known = self.learner.known_nodes();
        let known_requested = requested.intersection(&known).count();
        if known_requested >= threshold {
            return Ok(());
        }

        let unknown: HashSet<String> = requested.difference(&known).cloned().collect();
        let allow_missing = requested.len().saturating_sub(threshold);
        self.learner
            .block_until_specific_nodes_are_known(unknown, timeout, allow_missing)
            .await
            .map_err(|e| ClientError::Discovery(e.to_string()))
    }
}

fn ceil_multiply(n: usize, factor: f64) -> usize {
    (n as f64 * factor).ceil() as usize
}
