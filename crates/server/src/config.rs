use anyhow::anyhow;
use ecode_core::{
    LifecycleConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_GENERATION_ATTEMPTS, MAX_EXPIRY_HOURS,
};
use ecode_store::DEFAULT_TIMEOUT_SECS;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub lifecycle: LifecycleConfig,
    pub store_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_endpoint = std::env::var("STORE_ENDPOINT")
            .map_err(|_| anyhow!("STORE_ENDPOINT must be set to the record document URL"))?;
        let store_credential = std::env::var("STORE_CREDENTIAL")
            .map_err(|_| anyhow!("STORE_CREDENTIAL must be set"))?;

        let expiry_hours = checked_expiry_hours(env_or("CODE_EXPIRY_HOURS", DEFAULT_EXPIRY_HOURS))?;
        let lifecycle = LifecycleConfig::new(store_endpoint, store_credential)
            .with_default_expiry_hours(expiry_hours)
            .with_max_generation_attempts(env_or(
                "MAX_GENERATION_ATTEMPTS",
                DEFAULT_MAX_GENERATION_ATTEMPTS,
            ));

        if lifecycle.default_expiry_hours <= 0 {
            tracing::warn!(
                "CODE_EXPIRY_HOURS={} - codes without explicit expiry will be born expired",
                lifecycle.default_expiry_hours
            );
        }

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", DEFAULT_PORT),
            lifecycle,
            store_timeout_secs: env_or("STORE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        })
    }
}

fn checked_expiry_hours(hours: i64) -> anyhow::Result<i64> {
    if hours > MAX_EXPIRY_HOURS || hours < -MAX_EXPIRY_HOURS {
        return Err(anyhow!(
            "CODE_EXPIRY_HOURS={} is out of range (max {})",
            hours,
            MAX_EXPIRY_HOURS
        ));
    }
    Ok(hours)
}

/// Parses `key`, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
