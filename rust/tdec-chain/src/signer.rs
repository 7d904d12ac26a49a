use async_trait::async_trait;

use crate::types::TransactionRequest;

/// The tracker never holds a private key itself — signing is delegated
/// entirely behind this trait, per spec's explicit non-goal on user key
/// persistence.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, tx: &TransactionRequest) -> anyhow::Result<Vec<u8>>;
}
