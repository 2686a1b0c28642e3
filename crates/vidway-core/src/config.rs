//! Gateway configuration.
//!
//! Plain serde structs deserialized from TOML. Every table is optional and
//! falls back to production defaults, so a partial (or missing) config file
//! is always usable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub rate: RateConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl GatewayConfig {
    /// Parses a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Daily quota budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Total units available per window.
    pub capacity: u64,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            window_secs: 86_400,
        }
    }
}

impl QuotaConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Token-bucket rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// Token replenishment rate per second.
    pub tokens_per_second: f64,
    /// Maximum number of tokens the bucket holds.
    pub bucket_size: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            tokens_per_second: 1.0,
            bucket_size: 10.0,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live for cached responses, in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3_600 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Retry/backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempt budget, including the first attempt.
    pub max_attempts: u32,
    /// Initial backoff delay in seconds.
    pub base_delay_secs: f64,
    /// Backoff delay ceiling in seconds.
    pub max_delay_secs: f64,
    /// Timeout applied to each individual attempt, in seconds.
    pub per_attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_secs: 1.0,
            max_delay_secs: 60.0,
            per_attempt_timeout_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_secs)
    }

    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.per_attempt_timeout_secs)
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for sessions and resources. Defaults to `~/.vidway`
    /// when unset.
    pub data_dir: Option<PathBuf>,
}
