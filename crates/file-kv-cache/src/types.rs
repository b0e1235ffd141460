//! Cache types

use crate::expiration::DEFAULT_TTL_SECS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name used under the platform cache directory
const DEFAULT_DIR_NAME: &str = "file-kv-cache";

/// Description of a stored entry, without its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub key: String,
    pub storage_id: String,
    pub expires_at: DateTime<Utc>,
    pub size: u64,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Configuration for a cache instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub default_ttl_secs: i64,
}

impl CacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `CACHE_DIR` and `CACHE_TTL_SECS`, falling back
    /// to defaults for missing or unparsable values
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cache_dir = lookup("CACHE_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let default_ttl_secs = lookup("CACHE_TTL_SECS")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(defaults.default_ttl_secs);

        Self {
            cache_dir,
            default_ttl_secs,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(DEFAULT_DIR_NAME);
        Self {
            cache_dir,
            default_ttl_secs: DEFAULT_TTL_SECS, // 24 hours
        }
    }
}
