use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tdec_chain::{cancel_fee, speedup_fee, Address, BlockTag, ChainRpc, Nonce, Signer, TransactionRequest, TxHash};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::TrackerError;
use crate::policy::{FeePolicy, BLOCK_INTERVAL, BLOCK_SAMPLE_SIZE};
use crate::state::{read_state_file, TrackerState};

pub type TrackHook = Arc<dyn Fn(&[(Nonce, TxHash)]) + Send + Sync>;
pub type FinalizeHook = Arc<dyn Fn(&[Nonce]) + Send + Sync>;

/// Periodic control loop tracking pending EVM transactions by nonce,
/// speeding them up or cancelling them as gas conditions and timeouts
/// dictate. Grounded on `TransactionTracker` in the reference, restructured
/// from a `SimpleTask`-scheduled thread onto a single `tokio::spawn`ed
/// interval loop.
pub struct Tracker {
    chain: Arc<dyn ChainRpc>,
    signer: Arc<dyn Signer>,
    address: Address,
    policy: FeePolicy,
    on_track: Option<TrackHook>,
    on_finalize: Option<FinalizeHook>,
    state: Mutex<TrackerState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Tracker {
    pub fn new(
        chain: Arc<dyn ChainRpc>,
        signer: Arc<dyn Signer>,
        address: Address,
        state_path: PathBuf,
        policy: FeePolicy,
        on_track: Option<TrackHook>,
        on_finalize: Option<FinalizeHook>,
    ) -> Self {
        Self {
            chain,
            signer,
            address,
            policy,
            on_track,
            on_finalize,
            state: Mutex::new(TrackerState::new(state_path)),
            task: Mutex::new(None),
        }
    }

    pub async fn tracked(&self) -> Vec<(Nonce, TxHash)> {
        self.state.lock().await.snapshot()
    }

    pub async fn is_tracked(&self, nonce: Nonce) -> bool {
        self.state.lock().await.is_tracked(nonce)
    }

    pub async fn get_txhash(&self, nonce: Nonce) -> Option<TxHash> {
        self.state.lock().await.get(nonce).map(|p| p.tx_hash.clone())
    }

    /// Restores state from disk, reconciles against the chain's reported
    /// pending set, and schedules the periodic tick.
    pub async fn start(self: &Arc<Self>, run_now: bool) -> Result<(), TrackerError> {
        tracing::info!("starting transaction tracker");

        let pending_count = self.chain.get_transaction_count(&self.address, BlockTag::Pending).await?;
        let latest_count = self.chain.get_transaction_count(&self.address, BlockTag::Latest).await?;
        let pending_nonces: Vec<Nonce> = (latest_count..pending_count).collect();
        tracing::info!(count = pending_nonces.len(), ?pending_nonces, "detected pending transactions");

        self.restore_state(&pending_nonces).await?;
        self.cancel_untracked(&pending_nonces).await?;

        let interval = self.estimate_tick_interval().await?;
        tracing::info!(
            interval_secs = interval.as_secs(),
            max_tip = self.policy.max_tip_per_gas,
            "transaction tracker armed"
        );

        let handle = Arc::clone(self).spawn_periodic(interval, run_now);
        *self.task.lock().await = Some(handle);
        Ok(())
    }

    async fn restore_state(&self, pending_nonces: &[Nonce]) -> Result<(), TrackerError> {
        let restored = read_state_file(self.state.lock().await.path());
        if restored.is_empty() {
            tracing::info!("no tracked transactions restored from disk");
        } else {
            let missing: Vec<_> = pending_nonces.iter().filter(|n| !restored.contains_key(n)).collect();
            if missing.is_empty() {
                tracing::info!(count = restored.len(), "all cached transactions are tracked");
            } else {
                tracing::warn!(?missing, "untracked nonces found among restored state");
            }
        }
        let entries: Vec<(Nonce, TxHash)> = restored.into_iter().collect();
        self.track(&entries).await
    }

    /// The tracker refuses to steward a pending transaction it did not
    /// originate: any pending nonce absent from the restored map gets a
    /// cancellation replacement instead.
    async fn cancel_untracked(&self, pending_nonces: &[Nonce]) -> Result<(), TrackerError> {
        let untracked: Vec<Nonce> = {
            let state = self.state.lock().await;
            pending_nonces.iter().copied().filter(|n| !state.is_tracked(*n)).collect()
        };
        if untracked.is_empty() {
            return Ok(());
        }
        tracing::warn!(count = untracked.len(), ?untracked, "cancelling untracked pending transactions");
        self.cancel_transactions(&untracked).await
    }

    async fn estimate_tick_interval(&self) -> Result<Duration, TrackerError> {
        let latest = self.chain.get_block(BlockTag::Latest).await?;
        if latest.number == 0 {
            return Ok(Duration::from_secs(BLOCK_INTERVAL));
        }
        let sample_number = latest.number.saturating_sub(BLOCK_SAMPLE_SIZE);
        if sample_number == 0 {
            return Ok(Duration::from_secs(BLOCK_INTERVAL));
        }
        let base = self.chain.get_block(BlockTag::Number(sample_number)).await?;
        let avg_block_secs =
            latest.timestamp.saturating_sub(base.timestamp) as f64 / BLOCK_SAMPLE_SIZE as f64;
        let interval_secs = (avg_block_secs * BLOCK_INTERVAL as f64).round() as u64;
        Ok(Duration::from_secs(interval_secs.max(1)))
    }

    fn spawn_periodic(self: Arc<Self>, interval: Duration, run_now: bool) -> JoinHandle<()> {
        tokio::spawn(async move {
            if run_now {
                self.run_tick_logged().await;
            }
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.run_tick_logged().await;
            }
        })
    }

    /// Uncaught tick errors are logged and the loop continues to the next
    /// interval — the async equivalent of the reference's "restart the
    /// scheduled task" self-healing, since the loop task itself never
    /// exits on a tick failure.
    async fn run_tick_logged(&self) {
        if let Err(e) = self.run_tick().await {
            tracing::warn!(error = %e, "transaction tracker tick failed, will retry next interval");
        }
    }

    /// Forces a single tick out of band from the scheduled interval —
    /// useful for tests and for an operator-triggered "check now".
    pub async fn tick(&self) -> Result<(), TrackerError> {
        self.run_tick().await
    }

    async fn run_tick(&self) -> Result<(), TrackerError> {
        let snapshot = self.tracked().await;
        if snapshot.is_empty() {
            tracing::info!("steady as she goes, no pending transactions tracked");
            return Ok(());
        }
        tracing::info!(count = snapshot.len(), "tracking pending transactions");

        let mut replacements = Vec::new();
        let mut removals = Vec::new();

        for (nonce, tx_hash) in snapshot {
            let first_seen = match self.state.lock().await.get(nonce) {
                Some(pending) => pending.first_seen,
                None => continue,
            };
            if first_seen.elapsed() > self.policy.overall_timeout {
                tracing::warn!(nonce, "transaction exceeded the overall timeout, abandoning");
                removals.push(nonce);
                continue;
            }

            match self.speedup_transaction(&tx_hash).await {
                Ok(new_hash) => {
                    replacements.push((nonce, new_hash));
                    tokio::time::sleep(self.policy.rpc_throttle_interval).await;
                }
                Err(TrackerError::TransactionFinalized(_)) => {
                    removals.push(nonce);
                }
                Err(TrackerError::SpendingCapExceeded(_)) => {
                    tracing::warn!(nonce, cap = self.policy.max_tip_per_gas, "speed-up would exceed spending cap");
                }
                Err(TrackerError::NotFound(_)) => {
                    tracing::info!(nonce, %tx_hash, "transaction not found in mempool");
                    removals.push(nonce);
                }
                Err(e) => {
                    tracing::error!(nonce, %tx_hash, error = %e, "rpc error speeding up transaction, leaving it as-is");
                }
            }
        }

        if !replacements.is_empty() {
            tracing::info!(count = replacements.len(), "replaced transactions");
            self.track(&replacements).await?;
        }
        if !removals.is_empty() {
            tracing::info!(count = removals.len(), "untracked transactions");
            self.untrack(&removals).await?;
        }
        Ok(())
    }

    pub async fn track(&self, txs: &[(Nonce, TxHash)]) -> Result<(), TrackerError> {
        if txs.is_empty() {
            return Ok(());
        }
        {
            let mut state = self.state.lock().await;
            for (nonce, hash) in txs {
                state.track_one(*nonce, hash.clone());
            }
            state.persist()?;
        }
        if let Some(hook) = &self.on_track {
            hook(txs);
        }
        Ok(())
    }

    pub async fn untrack(&self, nonces: &[Nonce]) -> Result<(), TrackerError> {
        if nonces.is_empty() {
            return Ok(());
        }
        {
            let mut state = self.state.lock().await;
            for nonce in nonces {
                state.untrack_one(*nonce);
            }
            state.persist()?;
        }
        if let Some(hook) = &self.on_finalize {
            hook(nonces);
        }
        Ok(())
    }

    pub async fn speedup_transaction(&self, tx_hash: &TxHash) -> Result<TxHash, TrackerError> {
        let tx = self
            .chain
            .get_transaction(tx_hash)
            .await?
            .ok_or_else(|| TrackerError::NotFound(tx_hash.clone()))?;

        if self.is_finalized(&tx.hash, tx.is_mined()).await? {
            return Err(TrackerError::TransactionFinalized(tx_hash.clone()));
        }
        if tx.max_priority_fee_per_gas > self.policy.max_tip_per_gas {
            return Err(TrackerError::SpendingCapExceeded(tx_hash.clone()));
        }

        let suggested_tip = self.chain.max_priority_fee().await?;
        let base_fee = self.chain.get_block(BlockTag::Latest).await?.base_fee_per_gas;
        tracing::info!(base_fee_gwei = base_fee as f64 / 1e9, suggested_tip_gwei = suggested_tip as f64 / 1e9, "gas weather");
        let (new_tip, new_max_fee) =
            speedup_fee(tx.max_priority_fee_per_gas, tx.max_fee_per_gas, suggested_tip, base_fee, self.policy.bump_factor);

        // The reference only checks the cap against the existing tip; S7
        // requires the newly-computed tip to be checked too, since the
        // whole point of the cap is to bound what gets broadcast next.
        if new_tip > self.policy.max_tip_per_gas {
            return Err(TrackerError::SpendingCapExceeded(tx_hash.clone()));
        }

        tracing::info!(nonce = tx.nonce, tip = new_tip, max_fee = new_max_fee, "speeding up transaction");
        let chain_id = self.chain.chain_id().await?;
        let request = TransactionRequest {
            tx_type: TransactionRequest::TYPE_2,
            nonce: tx.nonce,
            to: tx.to.clone(),
            value: tx.value,
            gas: tx.gas,
            max_priority_fee_per_gas: new_tip,
            max_fee_per_gas: new_max_fee,
            chain_id,
            from: self.address.clone(),
        };
        self.sign_and_send(&request).await
    }

    pub async fn cancel_transaction(&self, nonce: Nonce) -> Result<TxHash, TrackerError> {
        let suggested_tip = self.chain.max_priority_fee().await?;
        let base_fee = self.chain.get_block(BlockTag::Latest).await?.base_fee_per_gas;
        tracing::info!(base_fee_gwei = base_fee as f64 / 1e9, suggested_tip_gwei = suggested_tip as f64 / 1e9, "gas weather");
        let (tip, max_fee) = cancel_fee(suggested_tip, base_fee, self.policy.cancel_bump_factor);

        tracing::info!(nonce, tip, max_fee, "cancelling transaction");
        let chain_id = self.chain.chain_id().await?;
        let request = TransactionRequest {
            tx_type: TransactionRequest::TYPE_2,
            nonce,
            to: self.address.clone(),
            value: 0,
            gas: TransactionRequest::CANCEL_GAS,
            max_priority_fee_per_gas: tip,
            max_fee_per_gas: max_fee,
            chain_id,
            from: self.address.clone(),
        };
        self.sign_and_send(&request).await
    }

    async fn cancel_transactions(&self, nonces: &[Nonce]) -> Result<(), TrackerError> {
        let mut replacements = Vec::with_capacity(nonces.len());
        for &nonce in nonces {
            let hash = self.cancel_transaction(nonce).await?;
            replacements.push((nonce, hash));
            tokio::time::sleep(self.policy.rpc_throttle_interval).await;
        }
        self.track(&replacements).await
    }

    async fn is_finalized(&self, hash: &TxHash, is_mined: bool) -> Result<bool, TrackerError> {
        if !is_mined {
            return Ok(false);
        }
        match self.chain.get_transaction_receipt(hash).await? {
            Some(receipt) => {
                if receipt.status == 0 {
                    tracing::info!(%hash, "transaction was reverted by the evm");
                }
                tracing::info!(%hash, block = receipt.block_number, "transaction has been included");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sign_and_send(&self, request: &TransactionRequest) -> Result<TxHash, TrackerError> {
        let raw = self.signer.sign(request).await.map_err(|e| TrackerError::Signer(e.to_string()))?;
        let hash = self.chain.send_raw_transaction(&raw).await?;
        tracing::info!(nonce = request.nonce, %hash, "broadcast transaction");
        Ok(hash)
    }
}
