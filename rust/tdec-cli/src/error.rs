//! Error types for tdec-cli

use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] tdec_config::ConfigError),

    #[error("chain RPC error: {0}")]
    Chain(#[from] tdec_chain::ChainRpcError),

    #[error("tracker error: {0}")]
    Tracker(#[from] tdec_tracker::TrackerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
