//! Shared secrets for signing and encryption.

use crate::error::{Result, TokenError};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::path::Path;
use zeroize::Zeroizing;

/// Length of a generated signing secret. 64 alphanumeric characters carry
/// well over 256 bits of entropy.
pub const SIGNING_SECRET_LEN: usize = 64;

/// Length of a generated encryption secret. Its UTF-8 bytes are the
/// A256GCM key, which must be exactly 32 bytes.
pub const ENCRYPTION_SECRET_LEN: usize = 32;

/// A symmetric secret. The key material is its UTF-8 bytes.
///
/// The value is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wrap a secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Generate a random alphanumeric secret of `len` characters.
    pub fn generate(len: usize) -> Self {
        let value: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        Self::new(value)
    }

    /// Load a secret from a file, trimming surrounding whitespace.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let value = std::fs::read_to_string(path).map_err(|e| {
            TokenError::Configuration(format!("cannot read secret {}: {e}", path.display()))
        })?;
        Ok(Self::new(value.trim()))
    }

    /// Whether the secret is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The key material.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The secret string, for writing it out in operator tooling.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Secret {}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Return the secret only when it is present and not blank.
pub(crate) fn usable(secret: Option<&Secret>) -> Option<&Secret> {
    secret.filter(|s| !s.is_blank())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_generate_lengths() {
        let signing = Secret::generate(SIGNING_SECRET_LEN);
        let encryption = Secret::generate(ENCRYPTION_SECRET_LEN);
        assert_eq!(signing.as_bytes().len(), 64);
        assert_eq!(encryption.as_bytes().len(), 32);
        assert!(signing.expose().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(Secret::generate(32), Secret::generate(32));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::new("hunter2hunter2hunter2hunter2hunter2");
        let printed = format!("{secret:?}");
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_blank() {
        assert!(Secret::new("").is_blank());
        assert!(Secret::new(" \t\n").is_blank());
        assert!(!Secret::new("x").is_blank());
        assert!(usable(Some(&Secret::new("  "))).is_none());
        assert!(usable(None).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  file-backed-secret  ").unwrap();
        let secret = Secret::load_from_file(file.path()).unwrap();
        assert_eq!(secret.expose(), "file-backed-secret");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Secret::load_from_file(Path::new("/nonexistent/tessera.key")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }
}
