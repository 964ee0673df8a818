//! Compact JWE serialization: `header.encryptedKey.iv.ciphertext.tag`.
//!
//! Only direct key agreement is produced, so the encrypted key segment is
//! always empty. The ASCII of the encoded protected header is the AAD.

use crate::crypto::{Decrypter, Encrypter, Sealed};
use crate::error::{Result, TokenError};
use crate::header::Header;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

/// Encrypt a nested token and return the compact serialization.
pub fn encrypt(nested: &str, encrypter: &dyn Encrypter) -> Result<String> {
    let header_segment =
        Header::jwe(encrypter.algorithm(), encrypter.encryption_method()).encode()?;
    let sealed = encrypter.encrypt(header_segment.as_bytes(), nested.as_bytes())?;

    Ok(format!(
        "{header_segment}..{}.{}.{}",
        URL_SAFE_NO_PAD.encode(&sealed.iv),
        URL_SAFE_NO_PAD.encode(&sealed.ciphertext),
        URL_SAFE_NO_PAD.encode(&sealed.tag),
    ))
}

/// A parsed, still encrypted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedToken {
    header: Header,
    header_segment: String,
    iv_segment: String,
    ciphertext_segment: String,
    tag_segment: String,
}

impl EncryptedToken {
    /// Build from the five segments. The encrypted key segment must already
    /// have been checked to be empty.
    pub(crate) fn from_segments(header: Header, segments: [&str; 5]) -> Self {
        let [header_segment, _, iv_segment, ciphertext_segment, tag_segment] = segments;
        Self {
            header,
            header_segment: header_segment.to_string(),
            iv_segment: iv_segment.to_string(),
            ciphertext_segment: ciphertext_segment.to_string(),
            tag_segment: tag_segment.to_string(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decrypt and authenticate the payload.
    pub fn decrypt(&self, decrypter: &dyn Decrypter) -> Result<Vec<u8>> {
        if self.header.alg != decrypter.algorithm()
            || self.header.enc.as_deref() != Some(decrypter.encryption_method())
        {
            return Err(TokenError::Format(format!(
                "token is encrypted with {}/{}, expected {}/{}",
                self.header.alg,
                self.header.enc.as_deref().unwrap_or("-"),
                decrypter.algorithm(),
                decrypter.encryption_method()
            )));
        }

        let sealed = Sealed {
            iv: decode_segment("IV", &self.iv_segment)?,
            ciphertext: decode_segment("ciphertext", &self.ciphertext_segment)?,
            tag: decode_segment("tag", &self.tag_segment)?,
        };

        decrypter.decrypt(self.header_segment.as_bytes(), &sealed)
    }

    /// The compact serialization.
    pub fn serialize(&self) -> String {
        format!(
            "{}..{}.{}.{}",
            self.header_segment, self.iv_segment, self.ciphertext_segment, self.tag_segment
        )
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Crypto(format!("{name} is not base64url")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{DirectAes256Gcm, IV_LEN};
    use crate::token::{ParsedToken, parse};

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

    fn zero_iv() -> [u8; IV_LEN] {
        [0u8; IV_LEN]
    }

    fn encrypted(token: &str) -> EncryptedToken {
        match parse(token).unwrap() {
            ParsedToken::Encrypted(encrypted) => encrypted,
            other => panic!("expected an encrypted token, got {:?}", other.form()),
        }
    }

    #[test]
    fn test_encrypt_shape() {
        let cipher = DirectAes256Gcm::new(KEY).unwrap().with_iv_source(zero_iv);
        let token = encrypt("a.b.c", &cipher).unwrap();
        let segments: Vec<&str> = token.split('.').collect();

        assert_eq!(segments.len(), 5);
        assert_eq!(segments[1], "");
        // twelve zero bytes
        assert_eq!(segments[2], "AAAAAAAAAAAAAAAA");

        let header = Header::decode(segments[0]).unwrap();
        assert_eq!(header.alg, "dir");
        assert_eq!(header.enc.as_deref(), Some("A256GCM"));
        assert_eq!(header.cty.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_fixed_iv_is_deterministic() {
        let cipher = DirectAes256Gcm::new(KEY).unwrap().with_iv_source(zero_iv);
        assert_eq!(
            encrypt("a.b.c", &cipher).unwrap(),
            encrypt("a.b.c", &cipher).unwrap()
        );
    }

    #[test]
    fn test_decrypt() {
        let cipher = DirectAes256Gcm::new(KEY).unwrap();
        let token = encrypt("a.b.c", &cipher).unwrap();
        let parsed = encrypted(&token);

        assert_eq!(parsed.decrypt(&cipher).unwrap(), b"a.b.c");
        assert_eq!(parsed.serialize(), token);
    }

    #[test]
    fn test_header_is_authenticated() {
        let cipher = DirectAes256Gcm::new(KEY).unwrap();
        let token = encrypt("a.b.c", &cipher).unwrap();
        let (_, rest) = token.split_once('.').unwrap();

        // Same algorithms, different header bytes
        let header = Header {
            typ: Some("JWT".to_string()),
            ..Header::jwe("dir", "A256GCM")
        };
        let swapped = format!("{}.{rest}", header.encode().unwrap());

        let err = encrypted(&swapped).decrypt(&cipher).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Crypto);
    }

    #[test]
    fn test_wrong_key() {
        let token = encrypt("a.b.c", &DirectAes256Gcm::new(KEY).unwrap()).unwrap();
        let other = DirectAes256Gcm::new(b"fedcba9876543210fedcba9876543210").unwrap();

        let err = encrypted(&token).decrypt(&other).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Crypto);
    }
}
