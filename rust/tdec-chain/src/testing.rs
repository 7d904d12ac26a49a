//! In-memory `ChainRpc`/`Signer` test doubles.
//!
//! Real ECDSA signing and RLP transaction encoding are out of scope (only
//! the abstract `sign(tx) -> raw_bytes` interface is required), so
//! `LocalSigner` stands in with a deterministic, inspectable stub.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sha3::{Digest, Keccak256};

use crate::rpc::{ChainRpc, ChainRpcError};
use crate::signer::Signer;
use crate::types::{Address, BlockHeader, BlockTag, RpcTransaction, TransactionReceipt, TransactionRequest, TxHash};

/// A fully in-memory `ChainRpc`, driven entirely by whatever the test sets
/// up. Grounded on the same trait-based mockability the teacher's code
/// uses for its chain-adjacent connectors.
#[derive(Default)]
pub struct MockChainRpc {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    pending_count: HashMap<String, u64>,
    latest_count: HashMap<String, u64>,
    blocks: HashMap<u64, BlockHeader>,
    latest_block_number: Option<u64>,
    suggested_tip: u128,
    transactions: HashMap<String, RpcTransaction>,
    receipts: HashMap<String, TransactionReceipt>,
    broadcast: Vec<Vec<u8>>,
    next_hash_counter: u64,
    chain_id: u64,
}

impl MockChainRpc {
    pub fn new() -> Self {
        Self { state: Mutex::new(MockState { chain_id: 1337, ..Default::default() }) }
    }

    pub fn set_pending_count(&self, address: &Address, count: u64) {
        self.state.lock().unwrap().pending_count.insert(address.0.clone(), count);
    }

    pub fn set_latest_count(&self, address: &Address, count: u64) {
        self.state.lock().unwrap().latest_count.insert(address.0.clone(), count);
    }

    pub fn set_latest_block(&self, header: BlockHeader) {
        let mut state = self.state.lock().unwrap();
        state.latest_block_number = Some(header.number);
        state.blocks.insert(header.number, header);
    }

    pub fn set_block(&self, header: BlockHeader) {
        self.state.lock().unwrap().blocks.insert(header.number, header);
    }

    pub fn set_suggested_tip(&self, tip: u128) {
        self.state.lock().unwrap().suggested_tip = tip;
    }

    pub fn insert_transaction(&self, tx: RpcTransaction) {
        self.state.lock().unwrap().transactions.insert(tx.hash.0.clone(), tx);
    }

    pub fn insert_receipt(&self, hash: &TxHash, receipt: TransactionReceipt) {
        self.state.lock().unwrap().receipts.insert(hash.0.clone(), receipt);
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().broadcast.clone()
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn get_transaction_count(&self, address: &Address, block: BlockTag) -> Result<u64, ChainRpcError> {
        let state = self.state.lock().unwrap();
        let map = match block {
            BlockTag::Pending => &state.pending_count,
            _ => &state.latest_count,
        };
        Ok(map.get(&address.0).copied().unwrap_or(0))
    }

    async fn get_block(&self, block: BlockTag) -> Result<BlockHeader, ChainRpcError> {
        let state = self.state.lock().unwrap();
        let number = match block {
            BlockTag::Number(n) => n,
            _ => state
                .latest_block_number
                .ok_or_else(|| ChainRpcError::Malformed("no latest block configured".to_string()))?,
        };
        state
            .blocks
            .get(&number)
            .cloned()
            .ok_or_else(|| ChainRpcError::Malformed(format!("no block {number} configured")))
    }

    async fn max_priority_fee(&self) -> Result<u128, ChainRpcError> {
        Ok(self.state.lock().unwrap().suggested_tip)
    }

    async fn get_transaction(&self, hash: &TxHash) -> Result<Option<RpcTransaction>, ChainRpcError> {
        Ok(self.state.lock().unwrap().transactions.get(&hash.0).cloned())
    }

    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, ChainRpcError> {
        Ok(self.state.lock().unwrap().receipts.get(&hash.0).cloned())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainRpcError> {
        let mut state = self.state.lock().unwrap();
        state.next_hash_counter += 1;
        let hash = TxHash(format!("0x{:064x}", state.next_hash_counter));
        state.broadcast.push(raw.to_vec());
        Ok(hash)
    }

    async fn chain_id(&self) -> Result<u64, ChainRpcError> {
        Ok(self.state.lock().unwrap().chain_id)
    }
}

/// A `Signer` that doesn't hold a real key: it "signs" by hashing the
/// transaction's serialized form, which is enough to exercise the
/// tracker's broadcast path deterministically in tests.
pub struct LocalSigner;

#[async_trait]
impl Signer for LocalSigner {
    async fn sign(&self, tx: &TransactionRequest) -> anyhow::Result<Vec<u8>> {
        let encoded = serde_json::to_vec(tx)?;
        let mut hasher = Keccak256::new();
        hasher.update(&encoded);
        Ok(hasher.finalize().to_vec())
    }
}
