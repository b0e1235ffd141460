//! Mapping from caller keys to on-disk file names

use crate::error::{CacheError, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a storage id: a hex-encoded SHA-256 digest
pub const STORAGE_ID_LEN: usize = 64;

/// Filesystem-safe identifier derived from a cache key.
///
/// Always 64 lowercase hex characters, so it is usable as a file name on
/// every supported platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId(String);

impl StorageId {
    /// Derive the storage id for a key, rejecting empty keys
    pub fn for_key(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Recognise a file name produced by [`StorageId::for_key`]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let valid = name.len() == STORAGE_ID_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Index of the lock stripe guarding this id
    pub(crate) fn stripe(&self, stripes: usize) -> usize {
        let prefix = u64::from_str_radix(&self.0[..16], 16).unwrap_or(0);
        (prefix % stripes as u64) as usize
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
