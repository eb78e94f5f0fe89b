//! Configuration.
//!
//! Layers, later wins:
//! 1. built-in defaults
//! 2. optional TOML file
//! 3. `STASH_`-prefixed environment variables (`STASH_MAX_FILE_SIZE_BYTES=...`)

use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Ttl;
use crate::sanitize::DEFAULT_MAX_LEN;

const MIB: u64 = 1024 * 1024;
const HOUR_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Raw, serializable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Largest accepted blob.
    pub max_file_size_bytes: u64,
    /// Default blob time-to-live.
    pub file_expiry_secs: u64,
    /// Period of the background sweep.
    pub sweep_interval_secs: u64,
    /// How long an expired id keeps answering `Expired` instead of `NotFound`.
    pub tombstone_retention_secs: u64,
    /// Base-name limit of the sanitizer.
    pub max_filename_len: usize,
    /// Number of files listed in the status report.
    pub status_file_limit: usize,
    /// Prefix of download URLs in ingest receipts.
    pub base_url: String,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 180 * MIB,
            file_expiry_secs: 24 * HOUR_SECS,
            sweep_interval_secs: HOUR_SECS,
            tombstone_retention_secs: 24 * HOUR_SECS,
            max_filename_len: DEFAULT_MAX_LEN,
            status_file_limit: 20,
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl StashConfig {
    /// Defaults + optional TOML file + environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(StashConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed("STASH_")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: StashConfig = figment
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::Invalid("max_file_size_bytes must be > 0".into()));
        }
        if self.file_expiry_secs == 0 {
            return Err(ConfigError::Invalid("file_expiry_secs must be > 0".into()));
        }
        if self.file_expiry_secs > Ttl::MAX_SECS {
            return Err(ConfigError::Invalid(format!(
                "file_expiry_secs must be <= {}",
                Ttl::MAX_SECS
            )));
        }
        if self.tombstone_retention_secs > Ttl::MAX_SECS {
            return Err(ConfigError::Invalid(format!(
                "tombstone_retention_secs must be <= {}",
                Ttl::MAX_SECS
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep_interval_secs must be > 0".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Validated view used by the blob store.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        self.validate()?;
        let default_ttl = Ttl::from_secs(self.file_expiry_secs).ok_or_else(|| {
            ConfigError::Invalid(format!("file_expiry_secs out of range: {}", self.file_expiry_secs))
        })?;
        let tombstone_retention = i64::try_from(self.tombstone_retention_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "tombstone_retention_secs out of range: {}",
                    self.tombstone_retention_secs
                ))
            })?;
        Ok(StoreConfig {
            max_size_bytes: self.max_file_size_bytes,
            default_ttl,
            tombstone_retention,
            max_filename_len: self.max_filename_len,
        })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Blob store settings; only constructible with a positive TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub max_size_bytes: u64,
    pub default_ttl: Ttl,
    pub tombstone_retention: TimeDelta,
    pub max_filename_len: usize,
}
