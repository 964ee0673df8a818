use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera_core::TesseraConfig;
use tessera_core::config::DEFAULT_CONFIG_FILE;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::token::{IdentityArgs, SecretArgs};

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Tessera identity token CLI")]
struct Cli {
    /// Configuration file. Defaults apply when it does not exist.
    #[arg(long, global = true, env = "TESSERA_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Secret management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Token generation, validation and inspection
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a signing secret and an encryption secret.
    Generate {
        /// Directory to write `signing.key` and `encryption.key` into
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Generate a token for an identity.
    Generate {
        #[command(flatten)]
        identity: IdentityArgs,

        #[command(flatten)]
        secrets: SecretArgs,

        /// Produce a signed token only, even when encryption is configured
        #[arg(long, default_value_t = false)]
        no_encrypt: bool,

        /// Write the token to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Validate a token and print the identity it carries.
    Validate {
        /// Token string, or a path to a file containing it
        token: String,

        #[command(flatten)]
        secrets: SecretArgs,

        /// Kind prepended to subjects that carry none
        #[arg(long)]
        default_kind: Option<String>,

        /// Print the identity as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show a token's header and claims without verifying it.
    Inspect {
        /// Token string, or a path to a file containing it
        token: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = TesseraConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration: {}", cli.config.display()))?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output } => commands::keys::generate(output),
        },
        Command::Token { cmd } => match cmd {
            TokenCommand::Generate {
                identity,
                secrets,
                no_encrypt,
                output,
            } => commands::token::generate(&config.token, identity, secrets, no_encrypt, output),
            TokenCommand::Validate {
                token,
                secrets,
                default_kind,
                json,
            } => commands::token::validate(&config.token, token, secrets, default_kind, json),
            TokenCommand::Inspect { token } => commands::token::inspect(token),
        },
    }
}
