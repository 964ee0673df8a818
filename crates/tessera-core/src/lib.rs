// Configuration types shared across all Tessera crates
pub mod config;

// Identity records carried by tokens
pub mod profile;

pub use config::{ConfigError, LoggingConfig, TesseraConfig, TokenConfig};
pub use profile::{IdentityRecord, ProfileError, RESERVED_ATTRIBUTES, SEPARATOR, is_reserved};
