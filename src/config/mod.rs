//! # Buildline Configuration
//!
//! Typed configuration for the cache, resource pools and result processor.
//!
//! Three presets mirror the deployment environments:
//!
//! - [`BuildlineConfig::default`] - production sizing
//! - [`BuildlineConfig::for_development`] - smaller cache, shorter TTL
//! - [`BuildlineConfig::for_test`] - tiny limits and millisecond TTLs for fast feedback
//!
//! [`ConfigLoader`] layers a preset, an optional TOML file and `BUILDLINE_*`
//! environment variables on top of each other.
//!
//! ```rust,no_run
//! use buildline_core::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! println!("cache ttl: {:?}", config.cache.ttl());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::constants::{cache_defaults, pool_limits, processing_defaults};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildlineConfig {
    pub cache: CacheConfig,
    pub pools: PoolConfig,
    pub processor: ProcessorConfig,
}

/// Build output cache limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size_bytes: usize,
    pub ttl_ms: u64,
}

impl CacheConfig {
    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: cache_defaults::MAX_SIZE_BYTES,
            ttl_ms: cache_defaults::TTL_MS,
        }
    }
}

/// Resource pool ceilings and idle limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle items retained per pool
    pub max_idle: usize,
    pub max_output_buffer_bytes: usize,
    pub max_error_buffer_bytes: usize,
    pub max_component_list_len: usize,
    pub max_string_list_len: usize,
    pub max_error_list_len: usize,
    /// Parent directory for execution context scratch directories
    pub temp_root: PathBuf,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: pool_limits::DEFAULT_MAX_IDLE,
            max_output_buffer_bytes: pool_limits::MAX_OUTPUT_BUFFER_BYTES,
            max_error_buffer_bytes: pool_limits::MAX_ERROR_BUFFER_BYTES,
            max_component_list_len: pool_limits::MAX_COMPONENT_LIST_LEN,
            max_string_list_len: pool_limits::MAX_STRING_LIST_LEN,
            max_error_list_len: pool_limits::MAX_ERROR_LIST_LEN,
            temp_root: std::env::temp_dir(),
        }
    }
}

/// Result processor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Capacity of the bounded result channel
    pub result_channel_capacity: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            result_channel_capacity: processing_defaults::RESULT_CHANNEL_CAPACITY,
        }
    }
}

impl BuildlineConfig {
    /// Test-optimized configuration with small limits and rapid expiry
    pub fn for_test() -> Self {
        Self {
            cache: CacheConfig {
                max_size_bytes: 64 * 1024,
                ttl_ms: 1_000, // 1 second for rapid test feedback
            },
            pools: PoolConfig {
                max_idle: 16,
                ..PoolConfig::default()
            },
            processor: ProcessorConfig {
                result_channel_capacity: 16,
            },
        }
    }

    /// Development configuration: moderate cache, short TTL so edits show quickly
    pub fn for_development() -> Self {
        Self {
            cache: CacheConfig {
                max_size_bytes: 64 * 1024 * 1024,
                ttl_ms: 5 * 60 * 1000, // 5 minutes
            },
            pools: PoolConfig {
                max_idle: 64,
                ..PoolConfig::default()
            },
            processor: ProcessorConfig {
                result_channel_capacity: 256,
            },
        }
    }

    /// Preset for a named environment; unknown names get production defaults
    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "test" => Self::for_test(),
            "development" => Self::for_development(),
            _ => Self::default(),
        }
    }

    /// Reject values that would make a subsystem unusable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.max_size_bytes == 0 {
            return Err(ConfigurationError::InvalidValue(
                "cache.max_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.cache.ttl_ms == 0 {
            return Err(ConfigurationError::InvalidValue(
                "cache.ttl_ms must be greater than 0".to_string(),
            ));
        }
        if self.pools.max_idle == 0 {
            return Err(ConfigurationError::InvalidValue(
                "pools.max_idle must be greater than 0".to_string(),
            ));
        }
        if self.processor.result_channel_capacity == 0 {
            return Err(ConfigurationError::InvalidValue(
                "processor.result_channel_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!(
            cache_max_size_bytes = self.cache.max_size_bytes,
            cache_ttl_ms = self.cache.ttl_ms,
            pool_max_idle = self.pools.max_idle,
            max_output_buffer_bytes = self.pools.max_output_buffer_bytes,
            max_error_buffer_bytes = self.pools.max_error_buffer_bytes,
            result_channel_capacity = self.processor.result_channel_capacity,
            "Buildline configuration"
        );
    }
}
