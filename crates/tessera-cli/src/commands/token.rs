//! Token commands.
//!
//! `tessera token generate` - Generate a token for an identity.
//! `tessera token validate` - Validate a token and print its identity.
//! `tessera token inspect` - Inspect a token's contents without verification.

use anyhow::Context;
use chrono::SecondsFormat;
use clap::Args;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_core::{IdentityRecord, TokenConfig};
use tessera_jwt::{JwtGenerator, JwtValidator, Secret, TokenError, inspect_token_unverified};

/// Secrets passed on the command line. Each one overrides the configured source.
#[derive(Args, Debug, Default)]
pub struct SecretArgs {
    /// Signing secret, or a path to a file containing it
    #[arg(long)]
    pub signing_secret: Option<String>,

    /// Encryption secret, or a path to a file containing it
    #[arg(long)]
    pub encryption_secret: Option<String>,
}

/// Where the identity to put in a token comes from.
#[derive(Args, Debug, Default)]
pub struct IdentityArgs {
    /// Typed id of the subject, e.g. `User#alice`
    #[arg(long, required_unless_present = "profile")]
    pub subject: Option<String>,

    /// Kind to prefix the subject with, e.g. `User`
    #[arg(long, requires = "subject")]
    pub kind: Option<String>,

    /// JSON file with `typed_id` and `attributes`
    #[arg(long, conflicts_with = "subject")]
    pub profile: Option<PathBuf>,

    /// Extra attribute as `key=value`; JSON values are kept typed (repeatable)
    #[arg(long = "attr", value_name = "KEY=VALUE")]
    pub attributes: Vec<String>,
}

/// Resolve a secret given either as a file path or as the literal value.
///
/// Without a command-line value the configured source (environment variable
/// or file) is used.
fn resolve_secret(
    value: Option<String>,
    configured: impl FnOnce() -> std::io::Result<Option<String>>,
) -> anyhow::Result<Option<Secret>> {
    if let Some(value) = value {
        // If it looks like a file path and the file exists, load from file
        let path = Path::new(&value);
        if path.exists() {
            return Secret::load_from_file(path)
                .map(Some)
                .with_context(|| format!("Failed to load secret from file: {}", path.display()));
        }
        return Ok(Some(Secret::new(value.trim())));
    }

    let configured = configured().context("Failed to read configured secret")?;
    Ok(configured.map(Secret::new))
}

fn resolve_signing_secret(config: &TokenConfig, value: Option<String>) -> anyhow::Result<Secret> {
    resolve_secret(value, || config.resolve_signing_secret())?
        .filter(|secret| !secret.is_blank())
        .context(
            "Signing secret not provided. Either pass --signing-secret or set TESSERA_SIGNING_SECRET",
        )
}

/// Parse a `key=value` attribute. Values that parse as JSON keep their type.
fn parse_attribute(attr: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = attr
        .split_once('=')
        .with_context(|| format!("Invalid attribute '{attr}'. Expected key=value"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}

fn build_identity(args: IdentityArgs) -> anyhow::Result<IdentityRecord> {
    let mut identity = match (args.profile, args.subject) {
        (Some(path), _) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read profile: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid profile: {}", path.display()))?
        }
        (None, Some(subject)) => match &args.kind {
            Some(kind) => IdentityRecord::with_kind(kind, &subject)?,
            None => IdentityRecord::new(subject)?,
        },
        (None, None) => anyhow::bail!("Either --subject or --profile is required"),
    };

    for attr in &args.attributes {
        let (key, value) = parse_attribute(attr)?;
        identity
            .add_attribute(key, value)
            .with_context(|| format!("Invalid attribute '{attr}'"))?;
    }

    Ok(identity)
}

/// Load a token from a file if the argument is a path, otherwise use it as is.
fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}

fn mint_token(
    config: &TokenConfig,
    identity: IdentityArgs,
    secrets: SecretArgs,
    no_encrypt: bool,
) -> anyhow::Result<(String, bool)> {
    let identity = build_identity(identity)?;
    let signing = resolve_signing_secret(config, secrets.signing_secret)?;

    let generator = if no_encrypt || !config.encrypt {
        JwtGenerator::with_encryption(signing, false)
    } else {
        let encryption = resolve_secret(secrets.encryption_secret, || {
            config.resolve_encryption_secret()
        })?
        .filter(|secret| !secret.is_blank())
        .context(
            "Encryption secret not provided. Pass --encryption-secret, set TESSERA_ENCRYPTION_SECRET, or use --no-encrypt",
        )?;
        JwtGenerator::with_secrets(signing, encryption)
    };

    let token = generator.generate(&identity)?;
    Ok((token, generator.is_encrypting()))
}

/// Generate a token and write it to a file or stdout.
pub fn generate(
    config: &TokenConfig,
    identity: IdentityArgs,
    secrets: SecretArgs,
    no_encrypt: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (token, encrypted) = mint_token(config, identity, secrets, no_encrypt)?;

    if let Some(output_path) = output {
        fs::write(&output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        if encrypted {
            println!("  Type: Encrypted (dir/A256GCM around HS256)");
        } else {
            println!("  Type: Signed (HS256)");
        }
    } else {
        // Print to stdout
        println!("{token}");
    }

    Ok(())
}

fn validator_for(
    config: &TokenConfig,
    secrets: SecretArgs,
    default_kind: Option<String>,
) -> anyhow::Result<JwtValidator> {
    let signing = resolve_signing_secret(config, secrets.signing_secret)?;
    let encryption = resolve_secret(secrets.encryption_secret, || {
        config.resolve_encryption_secret()
    })?;

    let mut validator = match encryption {
        Some(encryption) => JwtValidator::with_secrets(signing, encryption),
        None => JwtValidator::signing_only(signing),
    };
    if let Some(kind) = default_kind.or_else(|| config.default_kind.clone()) {
        validator = validator.with_default_kind(kind);
    }
    Ok(validator)
}

fn rejected(e: TokenError) -> anyhow::Error {
    anyhow::anyhow!("✖ Token validation failed ({}): {e}", e.kind())
}

/// Validate a token and print the identity it carries.
pub fn validate(
    config: &TokenConfig,
    token: String,
    secrets: SecretArgs,
    default_kind: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let validator = validator_for(config, secrets, default_kind)?;
    let token = read_token(token)?;

    let claims = validator.validate_claims(&token).map_err(rejected)?;
    let issuer = claims.issuer().map(str::to_string);
    let issued_at = claims.issued_at();
    let identity = claims
        .into_identity(validator.default_kind())
        .map_err(rejected)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
        return Ok(());
    }

    println!("✔ Token is valid");
    println!();
    println!("Identity:");
    println!("  Typed id: {}", identity.typed_id());
    if let Some(issuer) = issuer {
        println!("  Issuer: {issuer}");
    }
    if let Some(issued_at) = issued_at {
        println!(
            "  Issued at: {}",
            issued_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    if identity.attributes().is_empty() {
        println!("  Attributes: (none)");
    } else {
        println!("  Attributes:");
        for (key, value) in identity.attributes() {
            println!("    {key}: {value}");
        }
    }

    Ok(())
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let info = inspect_token_unverified(&token)?;

    println!("Token Information (NOT verified):");
    println!("  Form: {}", info.form);
    println!("  Header: {}", serde_json::to_string(&info.header)?);
    match &info.claims {
        Some(claims) => {
            println!();
            println!("{}", serde_json::to_string_pretty(claims)?);
        }
        None => println!("  Claims: (encrypted)"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const SIGNING: &str = "cli-signing-secret-0123456789abcdefgh";
    const ENCRYPTION: &str = "cli-encryption-key-0123456789abc";

    // Secrets come from the command line only
    fn config() -> TokenConfig {
        TokenConfig {
            signing_secret_env: None,
            encryption_secret_env: None,
            ..TokenConfig::default()
        }
    }

    fn secrets() -> SecretArgs {
        SecretArgs {
            signing_secret: Some(SIGNING.to_string()),
            encryption_secret: Some(ENCRYPTION.to_string()),
        }
    }

    fn subject(typed_id: &str, attributes: &[&str]) -> IdentityArgs {
        IdentityArgs {
            subject: Some(typed_id.to_string()),
            kind: None,
            profile: None,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(parse_attribute("role=admin").unwrap(), ("role".to_string(), json!("admin")));
        assert_eq!(parse_attribute("age=42").unwrap(), ("age".to_string(), json!(42)));
        assert_eq!(
            parse_attribute("groups=[\"a\",\"b\"]").unwrap(),
            ("groups".to_string(), json!(["a", "b"]))
        );
        assert_eq!(parse_attribute("url=a=b").unwrap(), ("url".to_string(), json!("a=b")));
        assert!(parse_attribute("no-value").is_err());
    }

    #[test]
    fn test_kind_prefix() {
        let args = IdentityArgs {
            kind: Some("User".to_string()),
            ..subject("alice", &["active=true"])
        };
        let identity = build_identity(args).unwrap();
        assert_eq!(identity.typed_id(), "User#alice");
        assert_eq!(identity.attribute("active"), Some(&json!(true)));
    }

    #[test]
    fn test_reserved_attribute_rejected() {
        let err = build_identity(subject("alice", &["iss=me"])).unwrap_err();
        assert!(err.to_string().contains("iss"));
    }

    #[test]
    fn test_mint_encrypted_and_validate() {
        let (token, encrypted) =
            mint_token(&config(), subject("User#alice", &["role=admin"]), secrets(), false)
                .unwrap();
        assert!(encrypted);
        assert_eq!(token.split('.').count(), 5);

        let validator = validator_for(&config(), secrets(), None).unwrap();
        let identity = validator.validate(&token).unwrap();
        assert_eq!(identity.typed_id(), "User#alice");
        assert_eq!(identity.attribute("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_mint_signed_only() {
        let (token, encrypted) =
            mint_token(&config(), subject("alice", &[]), secrets(), true).unwrap();
        assert!(!encrypted);
        assert_eq!(token.split('.').count(), 3);

        let validator = validator_for(&config(), secrets(), Some("User".to_string())).unwrap();
        assert_eq!(validator.validate(&token).unwrap().typed_id(), "User#alice");
    }

    #[test]
    fn test_encryption_secret_required_when_encrypting() {
        let secrets = SecretArgs {
            signing_secret: Some(SIGNING.to_string()),
            encryption_secret: None,
        };
        assert!(mint_token(&config(), subject("alice", &[]), secrets, false).is_err());
    }

    #[test]
    fn test_missing_signing_secret() {
        let err = mint_token(&config(), subject("alice", &[]), SecretArgs::default(), true)
            .unwrap_err();
        assert!(err.to_string().contains("Signing secret not provided"));
    }

    #[test]
    fn test_secrets_and_profile_from_files() {
        let dir = tempdir().unwrap();
        let signing_path = dir.path().join("signing.key");
        let encryption_path = dir.path().join("encryption.key");
        let profile_path = dir.path().join("profile.json");
        let token_path = dir.path().join("token.jwt");

        fs::write(&signing_path, format!("{SIGNING}\n")).unwrap();
        fs::write(&encryption_path, ENCRYPTION).unwrap();
        fs::write(
            &profile_path,
            r#"{"typed_id":"User#bob","attributes":{"groups":["ops"]}}"#,
        )
        .unwrap();

        let file_secrets = || SecretArgs {
            signing_secret: Some(signing_path.to_string_lossy().to_string()),
            encryption_secret: Some(encryption_path.to_string_lossy().to_string()),
        };
        let identity = IdentityArgs {
            subject: None,
            kind: None,
            profile: Some(profile_path.clone()),
            attributes: vec!["level=3".to_string()],
        };

        generate(&config(), identity, file_secrets(), false, Some(token_path.clone())).unwrap();
        assert!(token_path.exists());

        // Token read back from the file
        validate(
            &config(),
            token_path.to_string_lossy().to_string(),
            file_secrets(),
            None,
            false,
        )
        .unwrap();

        let token = fs::read_to_string(&token_path).unwrap();
        let identity = validator_for(&config(), file_secrets(), None)
            .unwrap()
            .validate(&token)
            .unwrap();
        assert_eq!(identity.typed_id(), "User#bob");
        assert_eq!(identity.attribute("groups"), Some(&json!(["ops"])));
        assert_eq!(identity.attribute("level"), Some(&json!(3)));
    }

    #[test]
    fn test_validation_uses_configured_secret_when_generation_is_signed_only() {
        let dir = tempdir().unwrap();
        let encryption_path = dir.path().join("encryption.key");
        fs::write(&encryption_path, format!("{ENCRYPTION}\n")).unwrap();

        let (token, encrypted) =
            mint_token(&config(), subject("alice", &[]), secrets(), false).unwrap();
        assert!(encrypted);

        let config = TokenConfig {
            encrypt: false,
            encryption_secret_file: Some(encryption_path),
            ..config()
        };
        let signing_only = SecretArgs {
            signing_secret: Some(SIGNING.to_string()),
            encryption_secret: None,
        };

        let identity = validator_for(&config, signing_only, None)
            .unwrap()
            .validate(&token)
            .unwrap();
        assert_eq!(identity.typed_id(), "JwtProfile#alice");
    }

    #[test]
    fn test_validate_with_wrong_secret_fails() {
        let (token, _) = mint_token(&config(), subject("alice", &[]), secrets(), false).unwrap();

        let wrong = SecretArgs {
            signing_secret: Some("another-signing-secret-0123456789abc".to_string()),
            encryption_secret: Some(ENCRYPTION.to_string()),
        };
        let err = validate(&config(), token, wrong, None, false).unwrap_err();
        assert!(err.to_string().contains("(verification)"));
    }

    #[test]
    fn test_inspect_signed_token() {
        let (token, _) = mint_token(&config(), subject("alice", &[]), secrets(), true).unwrap();
        inspect(token).unwrap();
        assert!(inspect("not-a-token".to_string()).is_err());
    }
}
