// SPDX-License-Identifier: MIT

//! Offline key validation
//!
//! Checks a key the way the companion validator program does: format first, then a
//! deterministic acceptance property over the key's SHA-256 digest. The generator
//! embeds no timestamp or secret, so the acceptance check is cosmetic and only a
//! fraction of well-formed keys pass it; this behavior is preserved as-is.

use crate::{Error, Result, KEY_ALPHABET, KEY_LENGTH};
use sha2::{Digest, Sha256};

/// Check length and alphabet membership
pub fn is_valid_format(key: &str) -> bool {
    key.len() == KEY_LENGTH && key.bytes().all(|b| KEY_ALPHABET.contains(&b))
}

/// Validate a key: format, then the digest acceptance property
///
/// The hex digest of an accepted key starts with two ASCII digits and ends with
/// two ASCII letters.
pub fn validate_key(key: &str) -> Result<()> {
    if !is_valid_format(key) {
        return Err(Error::Validation("Invalid key format".to_string()));
    }

    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    let bytes = digest.as_bytes();

    let first_two_digits = bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit();
    let last_two_alpha = bytes[bytes.len() - 2].is_ascii_alphabetic()
        && bytes[bytes.len() - 1].is_ascii_alphabetic();

    if first_two_digits && last_two_alpha {
        Ok(())
    } else {
        Err(Error::Validation("Invalid key".to_string()))
    }
}
