use tdec_pool::BatchFactoryConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("node discovery failed: {0}")]
    Discovery(String),
    #[error("invalid request batch: {0}")]
    Pool(#[from] BatchFactoryConfigError),
    #[error("decryption share factory aborted: {0}")]
    Producer(String),
}
