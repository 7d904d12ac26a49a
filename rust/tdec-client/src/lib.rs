//! Threshold decryption client: a node-availability precheck in front of a
//! worker-pool fan-out of one HTTP round trip per node.

mod client;
mod error;
mod learner;
mod transport;

pub use client::{ThresholdDecryptionClient, DEFAULT_DECRYPTION_TIMEOUT, DEFAULT_STAGGER_TIMEOUT};
pub use error::ClientError;
pub use learner::NodeLearner;
pub use transport::{HttpNodeTransport, NodeResponse, NodeTransport, TransportError};
