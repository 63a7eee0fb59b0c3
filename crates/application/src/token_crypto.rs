//! Random secrets and their at-rest hashes.
//!
//! API keys and reset tokens are only ever stored as SHA-256 hex digests; the
//! raw value is returned to the caller exactly once.

use std::fmt::Write;

use rosterhub_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Prefix that makes RosterHub API keys recognizable in logs and secret scanners.
pub const API_KEY_PREFIX: &str = "rh_";

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

/// Generates a cryptographically random token and its SHA-256 hash.
///
/// Returns `(raw_token_hex, sha256_hash_hex)`.
pub fn generate_secret_token() -> AppResult<(String, String)> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate secret token: {error}")))?;

    let raw_token = to_hex(&bytes);
    let hash = hash_secret(&raw_token);
    Ok((raw_token, hash))
}

/// Generates a new tenant API key and its SHA-256 hash.
pub fn generate_api_key() -> AppResult<(String, String)> {
    let (raw_token, _) = generate_secret_token()?;
    let api_key = format!("{API_KEY_PREFIX}{raw_token}");
    let hash = hash_secret(&api_key);
    Ok((api_key, hash))
}

/// Computes the SHA-256 hex digest of a secret for storage and lookup.
#[must_use]
pub fn hash_secret(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    to_hex(&hasher.finalize())
}
