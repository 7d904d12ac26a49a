use tdec_chain::{ChainRpcError, TxHash};

/// `TransactionFinalized` and `SpendingCapExceeded` are the two outcomes
/// `speedup_transaction` reports to a direct caller; the periodic loop
/// catches both internally and never lets them escape a tick.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("chain rpc error: {0}")]
    Chain(#[from] ChainRpcError),
    #[error("signer error: {0}")]
    Signer(String),
    #[error("disk io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("disk state is not valid json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("transaction {0} already finalized")]
    TransactionFinalized(TxHash),
    #[error("transaction {0} exceeds the spending cap")]
    SpendingCapExceeded(TxHash),
    #[error("transaction {0} not found in mempool")]
    NotFound(TxHash),
    #[error("no transaction tracked at nonce {0}")]
    UnknownNonce(u64),
}
