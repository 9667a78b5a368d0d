//! Configuration Loader
//!
//! Environment-aware loading. Sources are layered lowest to highest priority:
//!
//! 1. the preset for the detected environment (`BUILDLINE_ENV`, then `APP_ENV`)
//! 2. an optional TOML file
//! 3. environment variables, e.g. `BUILDLINE_CACHE__MAX_SIZE_BYTES=1048576`

use config::{Config, Environment, File};
use std::env;
use std::path::PathBuf;
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::BuildlineConfig;

const DEFAULT_ENV_PREFIX: &str = "BUILDLINE";

/// Detect the deployment environment from environment variables
pub fn detect_environment() -> String {
    env::var("BUILDLINE_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "production".to_string())
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    environment: String,
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            environment: detect_environment(),
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Use an explicit environment instead of the detected one
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Layer a TOML file over the preset. The file must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override the environment variable prefix (default `BUILDLINE`)
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Build, deserialize and validate the layered configuration
    pub fn load(&self) -> ConfigResult<BuildlineConfig> {
        let preset = BuildlineConfig::for_environment(&self.environment);
        let mut builder = Config::builder().add_source(Config::try_from(&preset)?);

        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigurationError::FileNotFound(path.display().to_string()));
            }
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: BuildlineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            environment = %self.environment,
            config = %serde_json::to_string(&config)
                .unwrap_or_else(|_| "[serialization error]".to_string()),
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}
