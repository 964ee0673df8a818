//! Cryptographic primitives behind the token codecs.
//!
//! The codecs only talk to the [`Signer`], [`Verifier`], [`Encrypter`] and
//! [`Decrypter`] traits. [`HmacSha256`] and [`DirectAes256Gcm`] are the fixed
//! algorithm choices used by the generator and validator.

use crate::error::{Result, TokenError};
use crate::header::{A256GCM, DIR, HS256};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Minimum HMAC-SHA256 key length in bytes (256 bits).
pub const MIN_HMAC_KEY_LEN: usize = 32;

/// A256GCM key length in bytes.
pub const AES_256_KEY_LEN: usize = 32;

/// GCM initialization vector length in bytes.
pub const IV_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Produces a MAC or signature over a JWS signing input.
pub trait Signer: Send + Sync {
    /// JWS `alg` value written into the header.
    fn algorithm(&self) -> &'static str;

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>>;
}

/// Checks a MAC or signature over a JWS signing input.
pub trait Verifier: Send + Sync {
    /// JWS `alg` value this verifier accepts.
    fn algorithm(&self) -> &'static str;

    /// Returns `Ok(false)` when the signature does not match.
    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<bool>;
}

/// Output of an authenticated encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Authenticated content encryption with a directly shared key.
pub trait Encrypter: Send + Sync {
    /// JWE `alg` value written into the header.
    fn algorithm(&self) -> &'static str;

    /// JWE `enc` value written into the header.
    fn encryption_method(&self) -> &'static str;

    fn encrypt(&self, aad: &[u8], plaintext: &[u8]) -> Result<Sealed>;
}

/// Inverse of [`Encrypter`].
pub trait Decrypter: Send + Sync {
    fn algorithm(&self) -> &'static str;

    fn encryption_method(&self) -> &'static str;

    /// Fails with [`TokenError::Crypto`] when the tag does not authenticate.
    fn decrypt(&self, aad: &[u8], sealed: &Sealed) -> Result<Vec<u8>>;
}

/// HMAC-SHA256 (`HS256`).
#[derive(Clone)]
pub struct HmacSha256 {
    key: Zeroizing<Vec<u8>>,
}

impl HmacSha256 {
    /// Create an HS256 signer/verifier.
    ///
    /// Keys shorter than 256 bits are rejected.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() < MIN_HMAC_KEY_LEN {
            return Err(TokenError::Crypto(format!(
                "HS256 secret must be at least {} bits, got {}",
                MIN_HMAC_KEY_LEN * 8,
                key.len() * 8
            )));
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    fn mac(&self, signing_input: &[u8]) -> Result<Hmac<Sha256>> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.key)
            .map_err(|e| TokenError::Crypto(format!("HS256 key rejected: {e}")))?;
        mac.update(signing_input);
        Ok(mac)
    }
}

impl Signer for HmacSha256 {
    fn algorithm(&self) -> &'static str {
        HS256
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>> {
        Ok(self.mac(signing_input)?.finalize().into_bytes().to_vec())
    }
}

impl Verifier for HmacSha256 {
    fn algorithm(&self) -> &'static str {
        HS256
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<bool> {
        // Constant-time comparison
        Ok(self.mac(signing_input)?.verify_slice(signature).is_ok())
    }
}

impl std::fmt::Debug for HmacSha256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Source of GCM initialization vectors.
pub type IvSource = fn() -> [u8; IV_LEN];

/// Draw a fresh random IV.
pub fn random_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);
    iv
}

/// Direct key agreement (`dir`) with AES-256-GCM content encryption (`A256GCM`).
#[derive(Clone)]
pub struct DirectAes256Gcm {
    cipher: Aes256Gcm,
    iv_source: IvSource,
}

impl DirectAes256Gcm {
    /// Create a cipher from a 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != AES_256_KEY_LEN {
            return Err(TokenError::Crypto(format!(
                "A256GCM secret must be exactly {} bits, got {}",
                AES_256_KEY_LEN * 8,
                key.len() * 8
            )));
        }
        let cipher = <Aes256Gcm as KeyInit>::new_from_slice(key)
            .map_err(|e| TokenError::Crypto(format!("A256GCM key rejected: {e}")))?;
        Ok(Self {
            cipher,
            iv_source: random_iv,
        })
    }

    /// Replace the IV source. Reusing an IV under one key breaks GCM, so
    /// anything other than [`random_iv`] belongs in tests only.
    pub fn with_iv_source(mut self, iv_source: IvSource) -> Self {
        self.iv_source = iv_source;
        self
    }
}

impl Encrypter for DirectAes256Gcm {
    fn algorithm(&self) -> &'static str {
        DIR
    }

    fn encryption_method(&self) -> &'static str {
        A256GCM
    }

    fn encrypt(&self, aad: &[u8], plaintext: &[u8]) -> Result<Sealed> {
        let iv = (self.iv_source)();
        let mut output = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), Payload { msg: plaintext, aad })
            .map_err(|e| TokenError::Crypto(format!("A256GCM encryption failed: {e}")))?;

        // aes-gcm appends the tag to the ciphertext
        let split = output.len().checked_sub(TAG_LEN).ok_or_else(|| {
            TokenError::Crypto("A256GCM output shorter than the tag".to_string())
        })?;
        let tag = output.split_off(split);

        Ok(Sealed {
            iv: iv.to_vec(),
            ciphertext: output,
            tag,
        })
    }
}

impl Decrypter for DirectAes256Gcm {
    fn algorithm(&self) -> &'static str {
        DIR
    }

    fn encryption_method(&self) -> &'static str {
        A256GCM
    }

    fn decrypt(&self, aad: &[u8], sealed: &Sealed) -> Result<Vec<u8>> {
        if sealed.iv.len() != IV_LEN {
            return Err(TokenError::Crypto(format!(
                "A256GCM IV must be {IV_LEN} bytes, got {}",
                sealed.iv.len()
            )));
        }
        if sealed.tag.len() != TAG_LEN {
            return Err(TokenError::Crypto(format!(
                "A256GCM tag must be {TAG_LEN} bytes, got {}",
                sealed.tag.len()
            )));
        }

        let mut msg = Vec::with_capacity(sealed.ciphertext.len() + TAG_LEN);
        msg.extend_from_slice(&sealed.ciphertext);
        msg.extend_from_slice(&sealed.tag);

        self.cipher
            .decrypt(Nonce::from_slice(&sealed.iv), Payload { msg: &msg, aad })
            .map_err(|_| TokenError::Crypto("A256GCM decryption failed".to_string()))
    }
}

impl std::fmt::Debug for DirectAes256Gcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectAes256Gcm")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

    fn fixed_iv() -> [u8; IV_LEN] {
        [7u8; IV_LEN]
    }

    // RFC 7515 appendix A.1
    #[test]
    fn test_hs256_rfc7515_vector() {
        let key = URL_SAFE_NO_PAD
            .decode(
                "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow",
            )
            .unwrap();
        let signing_input = "eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9.eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ";

        let hmac = HmacSha256::new(&key).unwrap();
        let signature = hmac.sign(signing_input.as_bytes()).unwrap();

        assert_eq!(
            URL_SAFE_NO_PAD.encode(&signature),
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"
        );
        assert!(hmac.verify(signing_input.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn test_hs256_rejects_short_key() {
        let err = HmacSha256::new(b"too-short").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Crypto);
    }

    #[test]
    fn test_hs256_detects_mismatch() {
        let hmac = HmacSha256::new(KEY).unwrap();
        let mut signature = hmac.sign(b"payload").unwrap();
        signature[0] ^= 0x01;
        assert!(!hmac.verify(b"payload", &signature).unwrap());
        assert!(!hmac.verify(b"payload", &signature[..16]).unwrap());
    }

    #[test]
    fn test_aes_gcm_seal_open() {
        let cipher = DirectAes256Gcm::new(KEY).unwrap().with_iv_source(fixed_iv);
        let sealed = cipher.encrypt(b"header", b"nested token").unwrap();

        assert_eq!(sealed.iv, fixed_iv().to_vec());
        assert_eq!(sealed.tag.len(), TAG_LEN);
        assert_eq!(sealed.ciphertext.len(), b"nested token".len());

        let opened = cipher.decrypt(b"header", &sealed).unwrap();
        assert_eq!(opened, b"nested token");
    }

    #[test]
    fn test_aes_gcm_rejects_wrong_aad_and_tag() {
        let cipher = DirectAes256Gcm::new(KEY).unwrap();
        let sealed = cipher.encrypt(b"header", b"nested token").unwrap();

        let err = cipher.decrypt(b"other", &sealed).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Crypto);

        let mut tampered = sealed.clone();
        tampered.tag[3] ^= 0x80;
        assert!(cipher.decrypt(b"header", &tampered).is_err());

        let mut truncated = sealed;
        truncated.tag.pop();
        assert!(cipher.decrypt(b"header", &truncated).is_err());
    }

    #[test]
    fn test_aes_gcm_key_length() {
        assert!(DirectAes256Gcm::new(&KEY[..16]).is_err());
        assert!(DirectAes256Gcm::new(&[0u8; 33]).is_err());
    }
}
