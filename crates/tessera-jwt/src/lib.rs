//! # tessera-jwt
//!
//! Stateless identity tokens for Tessera.
//!
//! This crate provides functionality for:
//! - Turning an [`IdentityRecord`] into a compact JWT signed with HS256
//! - Wrapping the signed JWT in a `dir` / A256GCM JWE when an encryption secret is set
//! - Validating such tokens and rebuilding the identity record
//! - Inspecting tokens without verification (for debugging)
//!
//! ## Token Shapes
//!
//! | Shape | Segments | Produced when |
//! |-------|----------|---------------|
//! | **Signed** | `header.claims.signature` | no encryption secret |
//! | **Encrypted** | `header..iv.ciphertext.tag` | encryption secret configured |
//! | **Unsecured** | `header.claims.` | never; always rejected |
//!
//! Generation signs, then encrypts. Validation decrypts, then verifies.
//!
//! ```no_run
//! use tessera_core::IdentityRecord;
//! use tessera_jwt::{JwtGenerator, JwtValidator};
//!
//! let identity = IdentityRecord::new("User#alice")?.with_attribute("role", "admin")?;
//!
//! let generator = JwtGenerator::with_secrets(
//!     "a-signing-secret-of-at-least-32-bytes",
//!     "an-encryption-key-of-32-bytes!!!",
//! );
//! let token = generator.generate(&identity)?;
//!
//! let validator = JwtValidator::with_secrets(
//!     "a-signing-secret-of-at-least-32-bytes",
//!     "an-encryption-key-of-32-bytes!!!",
//! );
//! assert_eq!(validator.validate(&token)?.typed_id(), "User#alice");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod claims;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod header;
pub mod jwe;
pub mod jws;
pub mod secret;
pub mod token;
pub mod validator;

pub use claims::ClaimSet;
pub use crypto::{Decrypter, DirectAes256Gcm, Encrypter, HmacSha256, Signer, Verifier};
pub use error::{ErrorKind, Result, TokenError};
pub use generator::JwtGenerator;
pub use secret::Secret;
pub use tessera_core::IdentityRecord;
pub use token::{ParsedToken, TokenForm, TokenInfo, inspect_token_unverified, parse};
pub use validator::{DEFAULT_PROFILE_KIND, JwtValidator};
