use std::fmt;
use serde::{Deserialize, Serialize};

/// A 20-byte EVM account address, kept as its 0x-prefixed hex form.
/// Fidelity with the on-wire JSON-RPC format matters more here than a
/// packed byte representation we'd only unpack again before every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 32-byte transaction hash, 0x-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential transaction counter for an externally-owned account.
pub type Nonce = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Pending => write!(f, "pending"),
            BlockTag::Number(n) => write!(f, "0x{:x}", n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: u64,
    pub base_fee_per_gas: u128,
}

/// The fields of a transaction as reported by `get_transaction`, trimmed
/// to what a replacement envelope can legitimately reuse. The reference
/// implementation strips `blockHash`, `blockNumber`, `transactionIndex`,
/// `yParity`, `input`, `gasPrice` and `hash` from the raw RPC response
/// before rebuilding a replacement; here that's structural rather than a
/// runtime strip, since we only ever read the fields this struct declares.
#[derive(Debug, Clone)]
pub struct RpcTransaction {
    pub hash: TxHash,
    pub nonce: Nonce,
    pub to: Address,
    pub value: u128,
    pub gas: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub block_hash: Option<String>,
}

impl RpcTransaction {
    /// A transaction is finalized once it has been mined into a block.
    pub fn is_mined(&self) -> bool {
        self.block_hash.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub block_number: u64,
    /// 1 = success, 0 = reverted.
    pub status: u8,
}

/// A type-2 (EIP-1559) transaction envelope, built fresh for every
/// broadcast rather than mutated in place from an RPC response.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub nonce: Nonce,
    pub to: Address,
    pub value: u128,
    pub gas: u64,
    #[serde(rename = "maxPriorityFeePerGas")]
    pub max_priority_fee_per_gas: u128,
    #[serde(rename = "maxFeePerGas")]
    pub max_fee_per_gas: u128,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    pub from: Address,
}

impl TransactionRequest {
    pub const TYPE_2: u8 = 2;
    /// Gas cost of a plain value transfer with no calldata; used for
    /// cancellation self-sends.
    pub const CANCEL_GAS: u64 = 21_000;
}
