//! Content keys for cache entries
//!
//! An entry's file name is its key: a fixed-length hexadecimal digest.
//! How the digest is computed is up to the caller; `from_content` exists
//! for callers that have no hashing scheme of their own.

use crate::error::{HoardError, HoardResult};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters in a key
pub const KEY_LENGTH: usize = 32;

/// A validated content key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Parse a key, accepting upper, lower or mixed case
    pub fn parse(s: &str) -> HoardResult<Self> {
        if is_key_name(s) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(HoardError::InvalidKey(s.to_string()))
        }
    }

    /// Derive a key from entry bytes (truncated SHA-256)
    pub fn from_content(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex::encode(&digest[..KEY_LENGTH / 2]))
    }

    /// The key as a file name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a file name has the shape of a content key
pub fn is_key_name(name: &str) -> bool {
    name.len() == KEY_LENGTH && name.bytes().all(|b| b.is_ascii_hexdigit())
}
