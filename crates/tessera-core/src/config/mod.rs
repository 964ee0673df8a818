//! Configuration types for Tessera.
//!
//! Configuration is loaded from a YAML file (`tessera.yaml` by default):
//!
//! ```yaml
//! token:
//!   signing_secret_env: TESSERA_SIGNING_SECRET
//!   encryption_secret_file: secrets/encryption.key
//!   encrypt: true
//!   default_kind: JwtProfile
//! logging:
//!   level: info
//! ```

pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use token::TokenConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "tessera.yaml";

/// Complete Tessera configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Token secrets and behaviour.
    #[serde(default)]
    pub token: TokenConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TesseraConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(kind) = &self.token.default_kind {
            if kind.trim().is_empty() {
                return Err(ConfigError::Config(
                    "token.default_kind must not be blank".to_string(),
                ));
            }
            if kind.contains(crate::profile::SEPARATOR) {
                return Err(ConfigError::Config(format!(
                    "token.default_kind must not contain '{}'",
                    crate::profile::SEPARATOR
                )));
            }
        }
        Ok(())
    }
}
