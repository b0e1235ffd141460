//! Disk-backed key/value cache with per-entry expiration
//!
//! Stores byte payloads under string keys in one directory per [`Cache`],
//! one file per entry. Each entry carries an absolute deadline; expired
//! entries read as absent and are deleted lazily when touched. Writes are
//! published by atomic rename, so readers never see a half-written entry.
//!
//! ```no_run
//! use chrono::Duration;
//! use file_kv_cache::Cache;
//!
//! # fn main() -> file_kv_cache::Result<()> {
//! let cache = Cache::open_dir("/tmp/my-cache")?;
//! cache.set_with_ttl("user:42", br#"{"name":"a"}"#, Duration::hours(1))?;
//! assert!(cache.get("user:42")?.is_some());
//! # Ok(())
//! # }
//! ```

mod async_cache;
mod cache;
mod error;
mod expiration;
mod key;
mod registry;
mod store;
mod typed;
mod types;

pub use async_cache::AsyncCache;
pub use cache::Cache;
pub use error::{CacheError, Result};
pub use expiration::{ExpirationPolicy, DEFAULT_TTL_SECS};
pub use key::StorageId;
pub use store::{EntryHeader, EntryStore, StoredEntry};
pub use typed::{
    decode_object, decode_properties, decode_string, encode_object, encode_properties,
    encode_string, CachedImage, ImageFormat,
};
pub use types::{CacheConfig, CacheStats, EntryInfo};
