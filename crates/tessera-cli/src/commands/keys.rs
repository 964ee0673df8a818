//! Secret management commands.
//!
//! `tessera keys generate` - Generate a signing secret and an encryption secret.

use std::fs;
use std::path::PathBuf;
use tessera_jwt::Secret;
use tessera_jwt::secret::{ENCRYPTION_SECRET_LEN, SIGNING_SECRET_LEN};

/// Generate a new pair of secrets.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let signing = Secret::generate(SIGNING_SECRET_LEN);
    let encryption = Secret::generate(ENCRYPTION_SECRET_LEN);

    if let Some(output_dir) = output {
        // Create output directory if it doesn't exist
        fs::create_dir_all(&output_dir)?;

        let signing_path = output_dir.join("signing.key");
        let encryption_path = output_dir.join("encryption.key");

        fs::write(&signing_path, signing.expose())?;
        fs::write(&encryption_path, encryption.expose())?;

        println!("✔ Generated secrets:");
        println!("  Signing secret:    {}", signing_path.display());
        println!("  Encryption secret: {}", encryption_path.display());
        println!();
        println!("⚠️  Keep both secrets private! Never commit them to version control.");
        println!();
        println!("Set as environment variables:");
        println!(
            "  export TESSERA_SIGNING_SECRET=$(cat {})",
            signing_path.display()
        );
        println!(
            "  export TESSERA_ENCRYPTION_SECRET=$(cat {})",
            encryption_path.display()
        );
    } else {
        // Print to stdout
        println!("Signing secret (keep secure!):");
        println!("{}", signing.expose());
        println!();
        println!("Encryption secret (keep secure!):");
        println!("{}", encryption.expose());
        println!();
        println!("Use --output <dir> to save secrets to files.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_secrets_to_files() {
        let dir = tempdir().unwrap();
        generate(Some(dir.path().to_path_buf())).unwrap();

        let signing = fs::read_to_string(dir.path().join("signing.key")).unwrap();
        let encryption = fs::read_to_string(dir.path().join("encryption.key")).unwrap();

        assert_eq!(signing.len(), SIGNING_SECRET_LEN);
        // A256GCM needs exactly 32 bytes
        assert_eq!(encryption.len(), 32);
        assert_ne!(signing, encryption);
    }

    #[test]
    fn test_generated_secrets_are_usable() {
        let dir = tempdir().unwrap();
        generate(Some(dir.path().join("nested"))).unwrap();

        let signing = Secret::load_from_file(&dir.path().join("nested/signing.key")).unwrap();
        let encryption =
            Secret::load_from_file(&dir.path().join("nested/encryption.key")).unwrap();

        let identity = tessera_core::IdentityRecord::new("alice").unwrap();
        let token = tessera_jwt::JwtGenerator::with_secrets(signing.clone(), encryption.clone())
            .generate(&identity)
            .unwrap();
        tessera_jwt::JwtValidator::with_secrets(signing, encryption)
            .validate(&token)
            .unwrap();
    }
}
