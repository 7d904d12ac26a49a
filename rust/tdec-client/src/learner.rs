use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

/// The node-discovery/learner subsystem is external to this crate (spec
/// treats it as a surrounding collaborator); this trait is the boundary
/// this client actually needs from it.
#[async_trait]
pub trait NodeLearner: Send + Sync {
    fn known_nodes(&self) -> HashSet<String>;

    /// Blocks (up to `timeout`) until all but `allow_missing` of `unknown`
    /// have been discovered.
    async fn block_until_specific_nodes_are_known(
        &self,
        unknown: HashSet<String>,
        timeout: Duration,
        allow_missing: usize,
    ) -> anyhow::Result<()>;
}
