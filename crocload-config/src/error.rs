//! Configuration error types

use std::fmt::Display;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment override is present but unusable
    #[error("Invalid value for {var}: {message}")]
    Env { var: String, message: String },

    #[error("Invalid {domain} configuration: {message}")]
    Domain { domain: String, message: String },
}

impl ConfigError {
    pub fn env(var: impl Into<String>, message: impl Display) -> Self {
        ConfigError::Env {
            var: var.into(),
            message: message.to_string(),
        }
    }

    pub fn domain(domain: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Domain {
            domain: domain.into(),
            message: message.into(),
        }
    }
}
