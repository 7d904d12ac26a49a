//! Chain RPC and signer interfaces, the EIP-1559 transaction envelope, and
//! the fee-bump/cancel math shared by the transaction tracker and, in
//! principle, any other component that needs to talk to a chain.

pub mod fee;
pub mod rpc;
pub mod signer;
pub mod types;

#[cfg(feature = "test-support")]
pub mod testing;

pub use fee::{cancel_fee, speedup_fee};
pub use rpc::{ChainRpc, ChainRpcError, ReqwestChainRpc};
pub use signer::Signer;
pub use types::{
    Address, BlockHeader, BlockTag, Nonce, RpcTransaction, TransactionReceipt, TransactionRequest, TxHash,
};
