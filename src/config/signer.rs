//! Signer configuration for the write path.
//!
//! The private key is read from `PRIVATE_KEY` right before use and is never part of
//! `config.toml`. Without it the service runs read-only.

use crate::errors::{Error, Result};
use alloy::signers::local::PrivateKeySigner;

/// Loads the signing key from `PRIVATE_KEY`, if set.
///
/// # Errors
/// Returns [`Error::Config`] when the variable is set but is not a valid key.
pub fn load_signer() -> Result<Option<PrivateKeySigner>> {
    match std::env::var("PRIVATE_KEY") {
        Ok(key) if !key.trim().is_empty() => parse_signer(&key).map(Some),
        _ => Ok(None),
    }
}

/// Parses a hex private key, with or without the `0x` prefix.
pub fn parse_signer(key: &str) -> Result<PrivateKeySigner> {
    let key = key.trim();
    let hex = key.strip_prefix("0x").unwrap_or(key);
    hex.parse::<PrivateKeySigner>().map_err(|e| Error::Config {
        message: format!("PRIVATE_KEY is not a valid private key: {e}"),
    })
}
