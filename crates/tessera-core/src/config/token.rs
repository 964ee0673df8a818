//! Token secret configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for token signing and encryption secrets.
///
/// Secrets are never written inline in the configuration file. Each one is
/// looked up from an environment variable first, then from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Environment variable containing the signing secret.
    #[serde(default = "default_signing_secret_env")]
    pub signing_secret_env: Option<String>,

    /// Path to a file containing the signing secret.
    #[serde(default)]
    pub signing_secret_file: Option<PathBuf>,

    /// Environment variable containing the encryption secret.
    #[serde(default = "default_encryption_secret_env")]
    pub encryption_secret_env: Option<String>,

    /// Path to a file containing the encryption secret.
    #[serde(default)]
    pub encryption_secret_file: Option<PathBuf>,

    /// Whether generated tokens are wrapped in the encryption envelope.
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// Kind prepended to subjects that carry no kind on validation.
    #[serde(default)]
    pub default_kind: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            signing_secret_env: default_signing_secret_env(),
            signing_secret_file: None,
            encryption_secret_env: default_encryption_secret_env(),
            encryption_secret_file: None,
            encrypt: true,
            default_kind: None,
        }
    }
}

impl TokenConfig {
    /// Resolve the signing secret from environment or file.
    pub fn resolve_signing_secret(&self) -> Result<Option<String>, std::io::Error> {
        resolve_secret(
            self.signing_secret_env.as_deref(),
            self.signing_secret_file.as_ref(),
        )
    }

    /// Resolve the encryption secret from environment or file.
    ///
    /// `encrypt` only governs generation; a configured secret is still
    /// returned so that encrypted tokens can be validated.
    pub fn resolve_encryption_secret(&self) -> Result<Option<String>, std::io::Error> {
        resolve_secret(
            self.encryption_secret_env.as_deref(),
            self.encryption_secret_file.as_ref(),
        )
    }
}

fn resolve_secret(
    env_var: Option<&str>,
    file: Option<&PathBuf>,
) -> Result<Option<String>, std::io::Error> {
    // Try environment variable first
    if let Some(env_var) = env_var {
        if let Ok(secret) = std::env::var(env_var) {
            if !secret.trim().is_empty() {
                return Ok(Some(secret.trim().to_string()));
            }
        }
    }

    // Try file path
    if let Some(path) = file {
        if path.exists() {
            let secret = std::fs::read_to_string(path)?;
            return Ok(Some(secret.trim().to_string()));
        }
    }

    Ok(None)
}

fn default_signing_secret_env() -> Option<String> {
    Some("TESSERA_SIGNING_SECRET".to_string())
}

fn default_encryption_secret_env() -> Option<String> {
    Some("TESSERA_ENCRYPTION_SECRET".to_string())
}

fn default_true() -> bool {
    true
}
