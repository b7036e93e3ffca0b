// SPDX-License-Identifier: MIT

//! Access-key generation, expiration arithmetic, and storage format
//!
//! The access key is the sole domain entity: a 24-character code sampled from a
//! 62-character alphabet, paired with an absolute expiration timestamp. The pair is
//! stored as a JSON object `{"key": ..., "expiration": <epoch ms>}` in a single slot.

use crate::{KEY_ALPHABET, KEY_LENGTH, KEY_TTL_MS};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Generated access code plus its expiration
///
/// Validity rule: a key is valid iff `now <= expiration`. The displayed remaining
/// time flips to "Expired" at `now == expiration`, one read before the slot is
/// actually purged; this boundary asymmetry is intentional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    /// The generated 24-character code
    pub key: String,

    /// Moment after which the key is invalid (milliseconds since epoch)
    pub expiration: i64,
}

/// Produce a random key by uniform sampling (with replacement) from the alphabet
///
/// Uses a non-cryptographic random source; no uniqueness check against prior keys.
pub fn generate_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_LENGTH)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

impl AccessKey {
    /// Issue a key valid for the fixed 24-hour lifetime starting at `now_ms`
    pub fn issue(key: String, now_ms: i64) -> Self {
        Self {
            key,
            expiration: now_ms + KEY_TTL_MS,
        }
    }

    /// Check whether the key has passed its expiration
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expiration
    }

    /// Milliseconds until expiration (negative once expired)
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expiration - now_ms
    }

    /// Human-readable remaining time: `"Expires in {H}h {M}m"` or `"Expired"`
    ///
    /// Integer hour/minute decomposition of the remaining delta; seconds dropped.
    pub fn format_remaining(&self, now_ms: i64) -> String {
        let diff = self.remaining_ms(now_ms);
        if diff <= 0 {
            return "Expired".to_string();
        }

        let hours = diff / (1000 * 60 * 60);
        let minutes = (diff % (1000 * 60 * 60)) / (1000 * 60);
        format!("Expires in {}h {}m", hours, minutes)
    }

    /// Serialize to the storage slot format
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Deserialize from the storage slot format
    pub fn from_json(s: &str) -> crate::Result<Self> {
        serde_json::from_str(s).map_err(Into::into)
    }
}
