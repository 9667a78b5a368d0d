//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
