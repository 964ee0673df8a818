//! JOSE protected headers.

use crate::error::{Result, TokenError};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

/// HMAC with SHA-256.
pub const HS256: &str = "HS256";

/// Unsecured JWS.
pub const NONE: &str = "none";

/// Direct use of a shared symmetric key as the content encryption key.
pub const DIR: &str = "dir";

/// AES-256 in Galois/Counter Mode.
pub const A256GCM: &str = "A256GCM";

/// Content type marking a nested JWT payload.
pub const CONTENT_TYPE_JWT: &str = "JWT";

/// A protected header of a JWS or JWE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Signing or key management algorithm.
    pub alg: String,

    /// Content encryption method (JWE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc: Option<String>,

    /// Content type of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,

    /// Media type of the whole token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    /// Header of a signed token.
    pub fn jws(alg: &str) -> Self {
        Self {
            alg: alg.to_string(),
            enc: None,
            cty: None,
            typ: None,
        }
    }

    /// Header of an encrypted token wrapping a nested JWT.
    pub fn jwe(alg: &str, enc: &str) -> Self {
        Self {
            alg: alg.to_string(),
            enc: Some(enc.to_string()),
            cty: Some(CONTENT_TYPE_JWT.to_string()),
            typ: None,
        }
    }

    /// Serialize and base64url-encode the header.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| TokenError::Format(format!("cannot serialize header: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a base64url header segment.
    pub fn decode(segment: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| TokenError::Format(format!("header is not base64url: {e}")))?;
        serde_json::from_slice(&json)
            .map_err(|e| TokenError::Format(format!("header is not a JOSE object: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jws_header_encoding() {
        // {"alg":"HS256"}
        assert_eq!(Header::jws(HS256).encode().unwrap(), "eyJhbGciOiJIUzI1NiJ9");
    }

    #[test]
    fn test_jwe_header_fields() {
        let header = Header::jwe(DIR, A256GCM);
        let decoded = Header::decode(&header.encode().unwrap()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.cty.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Header::decode("!!!").is_err());
        // "[1,2]"
        assert!(Header::decode("WzEsMl0").is_err());
    }
}
