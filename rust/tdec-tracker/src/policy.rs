use std::time::Duration;

/// Tunables for fee-bump and cancel replacement. Grounded on the
/// reference's `TransactionTracker` class constants.
#[derive(Debug, Clone)]
pub struct FeePolicy {
    pub max_tip_per_gas: u128,
    pub overall_timeout: Duration,
    pub rpc_throttle_interval: Duration,
    pub bump_factor: f64,
    pub cancel_bump_factor: f64,
}

impl FeePolicy {
    /// 10 gwei max tip, 1-hour timeout, 0.5s inter-RPC throttle, matching
    /// the reference's `DEFAULT_MAX_TIP`/`DEFAULT_TIMEOUT`/`RPC_THROTTLE`.
    pub fn new(max_tip_per_gas: u128, overall_timeout: Duration) -> Self {
        Self {
            max_tip_per_gas,
            overall_timeout,
            rpc_throttle_interval: Duration::from_millis(500),
            bump_factor: 1.2,
            cancel_bump_factor: 2.0,
        }
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::new(10_000_000_000, Duration::from_secs(60 * 60))
    }
}

/// Multiplied by the observed average block time to derive the tracker's
/// polling interval, per spec's "block-interval constant (default 20
/// blocks)".
pub const BLOCK_INTERVAL: u64 = 20;

/// Number of trailing blocks sampled to estimate average block time.
pub const BLOCK_SAMPLE_SIZE: u64 = 100_000;
