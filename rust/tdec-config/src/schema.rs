// Configuration schema and types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TdecConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for TdecConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            tracker: TrackerConfig::default(),
            chain: ChainConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Mirrors `tdec_pool::Pool`'s constructor arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    #[serde(default = "default_target_successes")]
    pub target_successes: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_stagger_secs")]
    pub stagger_secs: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_target_successes() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_stagger_secs() -> u64 {
    3
}

fn default_pool_size() -> usize {
    10
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            target_successes: default_target_successes(),
            timeout_secs: default_timeout_secs(),
            stagger_secs: default_stagger_secs(),
            pool_size: default_pool_size(),
        }
    }
}

/// Mirrors `tdec_tracker::FeePolicy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerConfig {
    #[serde(default = "default_max_tip_gwei")]
    pub max_tip_gwei: u64,
    #[serde(default = "default_overall_timeout_secs")]
    pub overall_timeout_secs: u64,
    #[serde(default = "default_rpc_throttle_secs")]
    pub rpc_throttle_secs: u64,
    #[serde(default = "default_bump_factor")]
    pub bump_factor: f64,
    #[serde(default = "default_cancel_bump_factor")]
    pub cancel_bump_factor: f64,
}

fn default_max_tip_gwei() -> u64 {
    10
}

fn default_overall_timeout_secs() -> u64 {
    60 * 60
}

fn default_rpc_throttle_secs() -> u64 {
    1
}

fn default_bump_factor() -> f64 {
    1.125
}

fn default_cancel_bump_factor() -> f64 {
    1.25
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tip_gwei: default_max_tip_gwei(),
            overall_timeout_secs: default_overall_timeout_secs(),
            rpc_throttle_secs: default_rpc_throttle_secs(),
            bump_factor: default_bump_factor(),
            cancel_bump_factor: default_cancel_bump_factor(),
        }
    }
}

/// Chain RPC endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { rpc_url: default_rpc_url() }
    }
}

/// Mirrors `tdec_client::ThresholdDecryptionClient::gather_encrypted_decryption_shares`'s
/// tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default = "default_decryption_timeout_secs")]
    pub decryption_timeout_secs: u64,
    #[serde(default = "default_stagger_timeout_secs")]
    pub stagger_timeout_secs: u64,
}

fn default_threshold() -> usize {
    1
}

fn default_decryption_timeout_secs() -> u64 {
    30
}

fn default_stagger_timeout_secs() -> u64 {
    3
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            decryption_timeout_secs: default_decryption_timeout_secs(),
            stagger_timeout_secs: default_stagger_timeout_secs(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
    #[error("could not determine home directory for default config path")]
    NoHomeDir,
}
