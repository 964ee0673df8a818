//! Token shape detection and unverified inspection.

use crate::error::{Result, TokenError};
use crate::header::{A256GCM, DIR, HS256, Header, NONE};
use crate::jwe::EncryptedToken;
use crate::jws::SignedToken;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;
use serde_json::Value;

/// The three shapes a compact token can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenForm {
    /// `header.claims.signature`
    Signed,
    /// `header.encryptedKey.iv.ciphertext.tag`
    Encrypted,
    /// `header.claims.` with `alg: none`
    Unsecured,
}

impl TokenForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenForm::Signed => "signed",
            TokenForm::Encrypted => "encrypted",
            TokenForm::Unsecured => "unsecured",
        }
    }
}

impl std::fmt::Display for TokenForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unsecured token. It is recognised so that it can be rejected explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsecuredToken {
    header: Header,
    payload_segment: String,
}

impl UnsecuredToken {
    pub fn header(&self) -> &Header {
        &self.header
    }
}

/// A token split into its parts, nothing verified yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedToken {
    Signed(SignedToken),
    Encrypted(EncryptedToken),
    Unsecured(UnsecuredToken),
}

impl ParsedToken {
    pub fn form(&self) -> TokenForm {
        match self {
            ParsedToken::Signed(_) => TokenForm::Signed,
            ParsedToken::Encrypted(_) => TokenForm::Encrypted,
            ParsedToken::Unsecured(_) => TokenForm::Unsecured,
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            ParsedToken::Signed(token) => token.header(),
            ParsedToken::Encrypted(token) => token.header(),
            ParsedToken::Unsecured(token) => token.header(),
        }
    }
}

/// Split a compact token and classify it by its header.
pub fn parse(token: &str) -> Result<ParsedToken> {
    let segments: Vec<&str> = token.split('.').collect();

    match segments.as_slice() {
        [header, payload, signature] => {
            let decoded = Header::decode(header)?;
            match decoded.alg.as_str() {
                NONE => Ok(ParsedToken::Unsecured(UnsecuredToken {
                    header: decoded,
                    payload_segment: payload.to_string(),
                })),
                HS256 => Ok(ParsedToken::Signed(SignedToken::from_segments(
                    decoded,
                    [*header, *payload, *signature],
                ))),
                other => Err(TokenError::Format(format!(
                    "unsupported JWS algorithm '{other}'"
                ))),
            }
        }
        [header, encrypted_key, iv, ciphertext, tag] => {
            let decoded = Header::decode(header)?;
            if decoded.alg != DIR || decoded.enc.as_deref() != Some(A256GCM) {
                return Err(TokenError::Format(format!(
                    "unsupported JWE algorithm '{}' with encryption '{}'",
                    decoded.alg,
                    decoded.enc.as_deref().unwrap_or("-")
                )));
            }
            if !encrypted_key.is_empty() {
                return Err(TokenError::Format(
                    "direct encryption carries no encrypted key".to_string(),
                ));
            }
            Ok(ParsedToken::Encrypted(EncryptedToken::from_segments(
                decoded,
                [*header, *encrypted_key, *iv, *ciphertext, *tag],
            )))
        }
        _ => Err(TokenError::Format(format!(
            "expected 3 or 5 segments, found {}",
            segments.len()
        ))),
    }
}

/// Information about a token (for inspection).
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    /// Shape of the token.
    pub form: TokenForm,
    /// Protected header.
    pub header: Header,
    /// Claims, for signed and unsecured tokens. Encrypted claims stay opaque.
    pub claims: Option<Value>,
}

/// Inspect a token without verification (for debugging).
///
/// Nothing returned here can be trusted.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo> {
    let parsed = parse(token)?;

    let claims = match &parsed {
        ParsedToken::Signed(signed) => Some(decode_claims(&signed.payload()?)?),
        ParsedToken::Unsecured(unsecured) => {
            let payload = URL_SAFE_NO_PAD
                .decode(&unsecured.payload_segment)
                .map_err(|e| TokenError::Format(format!("claims are not base64url: {e}")))?;
            Some(decode_claims(&payload)?)
        }
        ParsedToken::Encrypted(_) => None,
    };

    Ok(TokenInfo {
        form: parsed.form(),
        header: parsed.header().clone(),
        claims,
    })
}

fn decode_claims(payload: &[u8]) -> Result<Value> {
    serde_json::from_slice(payload)
        .map_err(|e| TokenError::Format(format!("claims are not valid JSON: {e}")))
}
