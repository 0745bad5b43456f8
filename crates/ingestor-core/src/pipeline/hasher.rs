//! Hasher - 機微なフィールドの一方向マスキング

use sha2::{Digest, Sha256};

/// Length of every masked value: a SHA-256 digest in hex.
pub const MASK_LEN: usize = 64;

/// Mask a sensitive value as the lowercase hex SHA-256 of its UTF-8 bytes.
///
/// Deterministic across runs so that masked columns can still be joined on.
/// The empty string is a valid input and hashes like any other.
pub fn mask(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}
