//! Token validation.

use crate::claims::ClaimSet;
use crate::crypto::{DirectAes256Gcm, HmacSha256};
use crate::error::{Result, TokenError};
use crate::jws::SignedToken;
use crate::secret::{Secret, usable};
use crate::token::{ParsedToken, parse};
use tessera_core::IdentityRecord;

/// Kind prepended to subjects that carry none.
pub const DEFAULT_PROFILE_KIND: &str = "JwtProfile";

/// Recovers identity records from tokens built by
/// [`JwtGenerator`](crate::JwtGenerator).
///
/// An encrypted token is decrypted first; the nested token must be signed.
/// The signature is always checked before any claim is read. The validator
/// keeps no state between calls.
#[derive(Debug, Clone)]
pub struct JwtValidator {
    signing_secret: Option<Secret>,
    encryption_secret: Option<Secret>,
    default_kind: String,
}

impl Default for JwtValidator {
    fn default() -> Self {
        Self {
            signing_secret: None,
            encryption_secret: None,
            default_kind: DEFAULT_PROFILE_KIND.to_string(),
        }
    }
}

impl JwtValidator {
    /// Use one secret for both signature and decryption.
    pub fn new(secret: impl Into<Secret>) -> Self {
        let secret = secret.into();
        let validator = Self {
            signing_secret: Some(secret.clone()),
            encryption_secret: Some(secret),
            ..Self::default()
        };
        warn_key_reuse();
        validator
    }

    /// Use distinct signing and encryption secrets.
    pub fn with_secrets(signing: impl Into<Secret>, encryption: impl Into<Secret>) -> Self {
        let validator = Self {
            signing_secret: Some(signing.into()),
            encryption_secret: Some(encryption.into()),
            ..Self::default()
        };
        if validator.signing_secret == validator.encryption_secret {
            warn_key_reuse();
        }
        validator
    }

    /// Accept signed tokens only; encrypted tokens fail with a configuration error.
    pub fn signing_only(signing: impl Into<Secret>) -> Self {
        Self {
            signing_secret: Some(signing.into()),
            ..Self::default()
        }
    }

    /// Kind prepended to subjects without one.
    pub fn with_default_kind(mut self, kind: impl Into<String>) -> Self {
        self.default_kind = kind.into();
        self
    }

    pub fn set_signing_secret(&mut self, secret: impl Into<Secret>) {
        self.signing_secret = Some(secret.into());
    }

    pub fn set_encryption_secret(&mut self, secret: impl Into<Secret>) {
        self.encryption_secret = Some(secret.into());
    }

    pub fn default_kind(&self) -> &str {
        &self.default_kind
    }

    /// Validate a token and rebuild the identity it carries.
    pub fn validate(&self, token: &str) -> Result<IdentityRecord> {
        let identity = self
            .validate_claims(token)
            .and_then(|claims| claims.into_identity(&self.default_kind))
            .inspect_err(|e| tracing::debug!(kind = %e.kind(), error = %e, "rejected token"))?;

        tracing::debug!(subject = identity.typed_id(), "validated token");
        Ok(identity)
    }

    /// Validate a token and return its verified claims, including the
    /// registered `iss` and `iat` that [`JwtValidator::validate`] drops.
    pub fn validate_claims(&self, token: &str) -> Result<ClaimSet> {
        let signing_secret = usable(self.signing_secret.as_ref())
            .ok_or_else(|| TokenError::missing_secret("signing secret"))?;

        let signed = match parse(token)? {
            ParsedToken::Signed(signed) => signed,
            ParsedToken::Encrypted(encrypted) => {
                let encryption_secret = usable(self.encryption_secret.as_ref())
                    .ok_or_else(|| TokenError::missing_secret("encryption secret"))?;
                let decrypter = DirectAes256Gcm::new(encryption_secret.as_bytes())?;
                let payload = encrypted.decrypt(&decrypter)?;
                nested_signed_token(&payload)?
            }
            ParsedToken::Unsecured(_) => {
                return Err(TokenError::Format("unsupported unsecured token".to_string()));
            }
        };

        let verifier = HmacSha256::new(signing_secret.as_bytes())?;
        signed.verify(&verifier)?;

        signed.claims()
    }
}

fn nested_signed_token(payload: &[u8]) -> Result<SignedToken> {
    let nested = std::str::from_utf8(payload)
        .map_err(|_| TokenError::Format("encrypted payload is not UTF-8".to_string()))?;
    match parse(nested)? {
        ParsedToken::Signed(signed) => Ok(signed),
        other => Err(TokenError::Format(format!(
            "encrypted payload is a {} token, expected a signed one",
            other.form()
        ))),
    }
}

fn warn_key_reuse() {
    tracing::warn!("Using the same secret for signing and encryption; consider distinct secrets");
}
