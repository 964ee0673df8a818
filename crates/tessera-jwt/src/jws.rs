//! Compact JWS serialization: `header.claims.signature`.

use crate::claims::ClaimSet;
use crate::crypto::{Signer, Verifier};
use crate::error::{Result, TokenError};
use crate::header::Header;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

/// Sign a claim set and return the compact serialization.
pub fn sign(claims: &ClaimSet, signer: &dyn Signer) -> Result<String> {
    let header_segment = Header::jws(signer.algorithm()).encode()?;
    let payload = serde_json::to_vec(&claims.to_json())
        .map_err(|e| TokenError::Format(format!("cannot serialize claims: {e}")))?;
    let payload_segment = URL_SAFE_NO_PAD.encode(payload);

    let signing_input = format!("{header_segment}.{payload_segment}");
    let signature = signer.sign(signing_input.as_bytes())?;

    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// A parsed, not yet verified, signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    header: Header,
    header_segment: String,
    payload_segment: String,
    signature_segment: String,
}

impl SignedToken {
    pub(crate) fn from_segments(header: Header, segments: [&str; 3]) -> Self {
        let [header_segment, payload_segment, signature_segment] = segments;
        Self {
            header,
            header_segment: header_segment.to_string(),
            payload_segment: payload_segment.to_string(),
            signature_segment: signature_segment.to_string(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The bytes covered by the signature.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_segment, self.payload_segment)
    }

    /// Check the signature.
    ///
    /// A signature that does not match, or that cannot even be decoded, is a
    /// [`TokenError::Verification`] failure.
    pub fn verify(&self, verifier: &dyn Verifier) -> Result<()> {
        if self.header.alg != verifier.algorithm() {
            return Err(TokenError::Verification(format!(
                "token is signed with {}, expected {}",
                self.header.alg,
                verifier.algorithm()
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(&self.signature_segment)
            .map_err(|_| TokenError::Verification("signature is not base64url".to_string()))?;

        if verifier.verify(self.signing_input().as_bytes(), &signature)? {
            Ok(())
        } else {
            Err(TokenError::Verification("signature mismatch".to_string()))
        }
    }

    /// Decode the payload without checking the signature.
    pub fn payload(&self) -> Result<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(&self.payload_segment)
            .map_err(|e| TokenError::Format(format!("claims are not base64url: {e}")))
    }

    /// Decode the claims without checking the signature.
    pub fn claims(&self) -> Result<ClaimSet> {
        ClaimSet::from_slice(&self.payload()?)
    }

    /// The compact serialization.
    pub fn serialize(&self) -> String {
        format!(
            "{}.{}.{}",
            self.header_segment, self.payload_segment, self.signature_segment
        )
    }
}
