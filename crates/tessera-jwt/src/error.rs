//! Error types for token generation and validation.

use thiserror::Error;

/// Errors that can occur while generating or validating a token.
///
/// Validation failures are routine outcomes of handling untrusted input.
/// Callers should reject the credential whatever the variant is, and keep
/// [`TokenError::kind`] for diagnostics.
#[derive(Debug, Error)]
pub enum TokenError {
    /// A required secret is missing or blank.
    #[error("missing configuration: {0}")]
    Configuration(String),

    /// The token does not have a supported shape.
    #[error("malformed token: {0}")]
    Format(String),

    /// A cryptographic primitive failed (bad key length, corrupt ciphertext or tag).
    #[error("cryptographic failure: {0}")]
    Crypto(String),

    /// The signature was checked and does not match.
    #[error("token verification failed: {0}")]
    Verification(String),
}

/// Coarse classification of a [`TokenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Format,
    Crypto,
    Verification,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Format => "format",
            ErrorKind::Crypto => "crypto",
            ErrorKind::Verification => "verification",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TokenError {
    /// The kind of failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::Configuration(_) => ErrorKind::Configuration,
            TokenError::Format(_) => ErrorKind::Format,
            TokenError::Crypto(_) => ErrorKind::Crypto,
            TokenError::Verification(_) => ErrorKind::Verification,
        }
    }

    pub(crate) fn missing_secret(name: &str) -> Self {
        TokenError::Configuration(format!("{name} must not be blank"))
    }
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;
