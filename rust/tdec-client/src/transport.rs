use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct NodeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport error contacting {node}: {message}")]
    Request { node: String, message: String },
}

/// One round-trip to a single peer. The spec treats this middleware as a
/// black box — only the request/response byte shapes matter here, not
/// how the bytes are framed on the wire.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    async fn send_decryption_request(
        &self,
        node: &str,
        request: &[u8],
        timeout: Duration,
    ) -> Result<NodeResponse, TransportError>;
}

/// Production transport: one HTTP POST per node.
pub struct HttpNodeTransport {
    client: reqwest::Client,
}

impl HttpNodeTransport {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for HttpNodeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeTransport for HttpNodeTransport {
    async fn send_decryption_request(
        &self,
        node: &str,
        request: &[u8],
        timeout: Duration,
    ) -> Result<NodeResponse, TransportError> {
        let response = self
            .client
            .post(node)
            .timeout(timeout)
            .body(request.to_vec())
            .send()
            .await
            .map_err(|e| TransportError::Request { node: node.to_string(), message: e.to_string() })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request { node: node.to_string(), message: e.to_string() })?
            .to_vec();
        Ok(NodeResponse { status, body })
    }
}
