use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::types::{Address, BlockHeader, BlockTag, RpcTransaction, TransactionReceipt, TxHash};

#[derive(Debug, thiserror::Error)]
pub enum ChainRpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The chain RPC surface the tracker consumes. Modeled as `Option<T>`
/// return values rather than a distinct "not found" error variant: in
/// idiomatic Rust the caller matching on `None` is clearer than catching
/// a specific exception type, and it composes better with `?`.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_transaction_count(&self, address: &Address, block: BlockTag) -> Result<u64, ChainRpcError>;
    async fn get_block(&self, block: BlockTag) -> Result<BlockHeader, ChainRpcError>;
    async fn max_priority_fee(&self) -> Result<u128, ChainRpcError>;
    async fn get_transaction(&self, hash: &TxHash) -> Result<Option<RpcTransaction>, ChainRpcError>;
    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, ChainRpcError>;
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainRpcError>;
    async fn chain_id(&self) -> Result<u64, ChainRpcError>;
}

/// Production `ChainRpc` backed by a JSON-RPC 2.0 HTTP endpoint, the
/// standard transport for Ethereum-compatible nodes.
pub struct ReqwestChainRpc {
    endpoint: String,
    client: reqwest::Client,
}

impl ReqwestChainRpc {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), client: reqwest::Client::new() }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainRpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: Value = self.client.post(&self.endpoint).json(&body).send().await?.json().await?;

        if let Some(error) = response.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-1);
            let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown rpc error").to_string();
            return Err(ChainRpcError::Rpc { code, message });
        }

        let result = response
            .get("result")
            .ok_or_else(|| ChainRpcError::Malformed("response missing result field".to_string()))?;
        serde_json::from_value(result.clone()).map_err(|e| ChainRpcError::Malformed(e.to_string()))
    }

    fn parse_hex_u64(value: &Value) -> Result<u64, ChainRpcError> {
        let s = value.as_str().ok_or_else(|| ChainRpcError::Malformed("expected hex string".to_string()))?;
        u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| ChainRpcError::Malformed(e.to_string()))
    }

    fn parse_hex_u128(value: &Value) -> Result<u128, ChainRpcError> {
        let s = value.as_str().ok_or_else(|| ChainRpcError::Malformed("expected hex string".to_string()))?;
        u128::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| ChainRpcError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ChainRpc for ReqwestChainRpc {
    async fn get_transaction_count(&self, address: &Address, block: BlockTag) -> Result<u64, ChainRpcError> {
        let value: Value = self
            .call("eth_getTransactionCount", json!([address.0, block.to_string()]))
            .await?;
        Self::parse_hex_u64(&value)
    }

    async fn get_block(&self, block: BlockTag) -> Result<BlockHeader, ChainRpcError> {
        let value: Value = self.call("eth_getBlockByNumber", json!([block.to_string(), false])).await?;
        let number = value
            .get("number")
            .ok_or_else(|| ChainRpcError::Malformed("block missing number".to_string()))
            .and_then(Self::parse_hex_u64)?;
        let timestamp = value
            .get("timestamp")
            .ok_or_else(|| ChainRpcError::Malformed("block missing timestamp".to_string()))
            .and_then(Self::parse_hex_u64)?;
        let base_fee_per_gas = value
            .get("baseFeePerGas")
            .ok_or_else(|| ChainRpcError::Malformed("block missing baseFeePerGas".to_string()))
            .and_then(Self::parse_hex_u128)?;
        Ok(BlockHeader { number, timestamp, base_fee_per_gas })
    }

    async fn max_priority_fee(&self) -> Result<u128, ChainRpcError> {
        let value: Value = self.call("eth_maxPriorityFeePerGas", json!([])).await?;
        Self::parse_hex_u128(&value)
    }

    async fn get_transaction(&self, hash: &TxHash) -> Result<Option<RpcTransaction>, ChainRpcError> {
        let value: Value = self.call("eth_getTransactionByHash", json!([hash.0])).await?;
        if value.is_null() {
            return Ok(None);
        }
        let get_str = |key: &str| -> Result<String, ChainRpcError> {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ChainRpcError::Malformed(format!("transaction missing {key}")))
        };
        Ok(Some(RpcTransaction {
            hash: TxHash(get_str("hash")?),
            nonce: Self::parse_hex_u64(value.get("nonce").unwrap_or(&Value::Null))?,
            to: Address(get_str("to")?),
            value: value.get("value").map(Self::parse_hex_u128).transpose()?.unwrap_or(0),
            gas: Self::parse_hex_u64(value.get("gas").unwrap_or(&Value::Null))?,
            max_priority_fee_per_gas: value
                .get("maxPriorityFeePerGas")
                .map(Self::parse_hex_u128)
                .transpose()?
                .unwrap_or(0),
            max_fee_per_gas: value.get("maxFeePerGas").map(Self::parse_hex_u128).transpose()?.unwrap_or(0),
            block_hash: value.get("blockHash").and_then(Value::as_str).map(str::to_string),
        }))
    }

    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, ChainRpcError> {
        let value: Value = self.call("eth_getTransactionReceipt", json!([hash.0])).await?;
        if value.is_null() {
            return Ok(None);
        }
        let block_number = value
            .get("blockNumber")
            .ok_or_else(|| ChainRpcError::Malformed("receipt missing blockNumber".to_string()))
            .and_then(Self::parse_hex_u64)?;
        let status = value
            .get("status")
            .ok_or_else(|| ChainRpcError::Malformed("receipt missing status".to_string()))
            .and_then(Self::parse_hex_u64)? as u8;
        Ok(Some(TransactionReceipt { block_number, status }))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainRpcError> {
        let encoded = format!("0x{}", hex::encode(raw));
        let value: Value = self.call("eth_sendRawTransaction", json!([encoded])).await?;
        let hash = value.as_str().ok_or_else(|| ChainRpcError::Malformed("expected tx hash string".to_string()))?;
        Ok(TxHash(hash.to_string()))
    }

    async fn chain_id(&self) -> Result<u64, ChainRpcError> {
        let value: Value = self.call("eth_chainId", json!([])).await?;
        Self::parse_hex_u64(&value)
    }
}
