// Environment variable override support
//
// Every field is individually overridable via `TDEC_<SECTION>_<KEY>`, e.g.:
//   TDEC_POOL_POOL_SIZE=20
//   TDEC_TRACKER_MAX_TIP_GWEI=15
//   TDEC_CHAIN_RPC_URL=https://mainnet.infura.io/v3/...
//   TDEC_CLIENT_THRESHOLD=5

use std::env;

use crate::schema::{ConfigError, TdecConfig};

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Validation(format!("invalid value for {key}: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

pub fn apply_env_overrides(config: &mut TdecConfig) -> Result<(), ConfigError> {
    if let Some(v) = parse_env("TDEC_POOL_TARGET_SUCCESSES")? {
        config.pool.target_successes = v;
    }
    if let Some(v) = parse_env("TDEC_POOL_TIMEOUT_SECS")? {
        config.pool.timeout_secs = v;
    }
    if let Some(v) = parse_env("TDEC_POOL_STAGGER_SECS")? {
        config.pool.stagger_secs = v;
    }
    if let Some(v) = parse_env("TDEC_POOL_POOL_SIZE")? {
        config.pool.pool_size = v;
    }

    if let Some(v) = parse_env("TDEC_TRACKER_MAX_TIP_GWEI")? {
        config.tracker.max_tip_gwei = v;
    }
    if let Some(v) = parse_env("TDEC_TRACKER_OVERALL_TIMEOUT_SECS")? {
        config.tracker.overall_timeout_secs = v;
    }
    if let Some(v) = parse_env("TDEC_TRACKER_RPC_THROTTLE_SECS")? {
        config.tracker.rpc_throttle_secs = v;
    }
    if let Some(v) = parse_env("TDEC_TRACKER_BUMP_FACTOR")? {
        config.tracker.bump_factor = v;
    }
    if let Some(v) = parse_env("TDEC_TRACKER_CANCEL_BUMP_FACTOR")? {
        config.tracker.cancel_bump_factor = v;
    }

    if let Ok(v) = env::var("TDEC_CHAIN_RPC_URL") {
        config.chain.rpc_url = v;
    }

    if let Some(v) = parse_env("TDEC_CLIENT_THRESHOLD")? {
        config.client.threshold = v;
    }
    if let Some(v) = parse_env("TDEC_CLIENT_DECRYPTION_TIMEOUT_SECS")? {
        config.client.decryption_timeout_secs = v;
    }
    if let Some(v) = parse_env("TDEC_CLIENT_STAGGER_TIMEOUT_SECS")? {
        config.client.stagger_timeout_secs = v;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable tests mutate process-wide state; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn rpc_url_override_replaces_default_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("TDEC_CHAIN_RPC_URL", "https://example.invalid");
        let mut config = TdecConfig::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.chain.rpc_url, "https://example.invalid");
        env::remove_var("TDEC_CHAIN_RPC_URL");
    }

    #[test]
    fn invalid_numeric_override_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("TDEC_POOL_POOL_SIZE", "not-a-number");
        let mut config = TdecConfig::default();
        assert!(apply_env_overrides(&mut config).is_err());
        env::remove_var("TDEC_POOL_POOL_SIZE");
    }

    #[test]
    fn unset_vars_leave_defaults_untouched() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut config = TdecConfig::default();
        let before = config.clone();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config, before);
    }
}
