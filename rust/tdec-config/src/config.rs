//! Configuration loading and management.
//!
//! Loading hierarchy: env > file > defaults.

use std::fs;
use std::path::PathBuf;

use crate::schema::{ConfigError, TdecConfig};

/// Load configuration from an explicit path, or the default
/// `~/.config/tdec/config.toml` if `path` is `None`.
pub fn load_config(path: Option<PathBuf>) -> Result<TdecConfig, ConfigError> {
    let config_file = match path {
        Some(p) => p,
        None => default_config_file_path()?,
    };

    let mut config = if config_file.exists() {
        load_from_file(&config_file)?
    } else {
        TdecConfig::default()
    };

    crate::env::apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

pub fn load_from_file(path: &PathBuf) -> Result<TdecConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: TdecConfig = toml::from_str(&content)?;
    Ok(config)
}

/// `~/.config/tdec/config.toml`, matching the XDG-style default used
/// elsewhere in the workspace.
pub fn default_config_file_path() -> Result<PathBuf, ConfigError> {
    let mut path = dirs::config_dir().ok_or(ConfigError::NoHomeDir)?;
    path.push("tdec");
    path.push("config.toml");
    Ok(path)
}

pub fn validate_config(config: &TdecConfig) -> Result<(), ConfigError> {
    if config.pool.pool_size == 0 {
        return Err(ConfigError::Validation("pool.pool_size must be greater than 0".to_string()));
    }
    if config.pool.target_successes == 0 {
        return Err(ConfigError::Validation(
            "pool.target_successes must be greater than 0".to_string(),
        ));
    }
    if config.tracker.bump_factor <= 1.0 {
        return Err(ConfigError::Validation(
            "tracker.bump_factor must be greater than 1.0".to_string(),
        ));
    }
    if config.tracker.cancel_bump_factor <= 1.0 {
        return Err(ConfigError::Validation(
            "tracker.cancel_bump_factor must be greater than 1.0".to_string(),
        ));
    }
    if config.client.threshold == 0 {
        return Err(ConfigError::Validation("client.threshold must be greater than 0".to_string()));
    }
    if !config.chain.rpc_url.starts_with("http://")
        && !config.chain.rpc_url.starts_with("https://")
        && !config.chain.rpc_url.starts_with("ws://")
        && !config.chain.rpc_url.starts_with("wss://")
    {
        return Err(ConfigError::Validation(format!(
            "chain.rpc_url {:?} must be http://, https://, ws://, or wss://",
            config.chain.rpc_url
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        validate_config(&TdecConfig::default()).expect("defaults must be valid");
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let mut config = TdecConfig::default();
        config.pool.pool_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn non_http_rpc_url_is_rejected() {
        let mut config = TdecConfig::default();
        config.chain.rpc_url = "ftp://example.com".to_string();
        assert!(validate_config(&config).is_err());
    }
}
