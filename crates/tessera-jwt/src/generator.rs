//! Token generation.

use crate::claims::ClaimSet;
use crate::crypto::{DirectAes256Gcm, HmacSha256};
use crate::error::{Result, TokenError};
use crate::secret::{Secret, usable};
use crate::{jwe, jws};
use chrono::{DateTime, Utc};
use tessera_core::IdentityRecord;

/// Value of the `iss` claim on every generated token.
pub const ISSUER: &str = "JwtGenerator";

/// Builds signed, and optionally encrypted, tokens from identity records.
///
/// The claims are signed with HS256 first. When an encryption secret is
/// configured the signed token becomes the payload of a `dir`/A256GCM JWE.
#[derive(Debug, Clone)]
pub struct JwtGenerator {
    signing_secret: Option<Secret>,
    encryption_secret: Option<Secret>,
}

impl JwtGenerator {
    /// Sign and encrypt with the same secret.
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self::with_encryption(secret, true)
    }

    /// Sign with `secret`, and encrypt with it too when `encrypted` is set.
    pub fn with_encryption(secret: impl Into<Secret>, encrypted: bool) -> Self {
        let secret = secret.into();
        let encryption_secret = encrypted.then(|| secret.clone());
        Self::build(Some(secret), encryption_secret)
    }

    /// Use distinct signing and encryption secrets.
    pub fn with_secrets(signing: impl Into<Secret>, encryption: impl Into<Secret>) -> Self {
        Self::build(Some(signing.into()), Some(encryption.into()))
    }

    fn build(signing_secret: Option<Secret>, encryption_secret: Option<Secret>) -> Self {
        let generator = Self {
            signing_secret,
            encryption_secret,
        };
        if generator.reuses_key() {
            tracing::warn!(
                "Using the same secret for signing and encryption; consider distinct secrets"
            );
        }
        generator
    }

    fn reuses_key(&self) -> bool {
        match (
            usable(self.signing_secret.as_ref()),
            usable(self.encryption_secret.as_ref()),
        ) {
            (Some(signing), Some(encryption)) => signing == encryption,
            _ => false,
        }
    }

    /// Whether generated tokens are wrapped in the encryption envelope.
    pub fn is_encrypting(&self) -> bool {
        usable(self.encryption_secret.as_ref()).is_some()
    }

    /// Generate a token issued now.
    pub fn generate(&self, identity: &IdentityRecord) -> Result<String> {
        self.generate_at(identity, Utc::now())
    }

    /// Generate a token with an explicit issue time.
    pub fn generate_at(
        &self,
        identity: &IdentityRecord,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let signing_secret = usable(self.signing_secret.as_ref())
            .ok_or_else(|| TokenError::missing_secret("signing secret"))?;
        let signer = HmacSha256::new(signing_secret.as_bytes())?;

        let claims = ClaimSet::for_identity(identity, ISSUER, issued_at);
        let signed = jws::sign(&claims, &signer)?;

        let token = match usable(self.encryption_secret.as_ref()) {
            Some(encryption_secret) => {
                let encrypter = DirectAes256Gcm::new(encryption_secret.as_bytes())?;
                jwe::encrypt(&signed, &encrypter)?
            }
            None => signed,
        };

        tracing::debug!(
            subject = identity.typed_id(),
            encrypted = self.is_encrypting(),
            "generated token"
        );
        Ok(token)
    }
}
