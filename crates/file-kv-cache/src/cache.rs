//! The cache facade: expiration, lazy reclaim, and locking over an [`EntryStore`]

use crate::error::Result;
use crate::expiration::ExpirationPolicy;
use crate::key::StorageId;
use crate::registry::DirectoryClaim;
use crate::store::EntryStore;
use crate::types::{CacheConfig, CacheStats, EntryInfo};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, LazyLock, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use tracing::{debug, info, warn};

/// Number of per-key lock stripes
const LOCK_STRIPES: usize = 64;

static SHARED: LazyLock<Mutex<Option<Arc<Cache>>>> = LazyLock::new(|| Mutex::new(None));

/// A disk-backed key/value cache owning one directory.
///
/// Every entry carries a deadline; expired entries read as absent and are
/// deleted when `get` or `has` touches them. Nothing runs in the background,
/// so entries that are never read again stay on disk until [`Cache::clear`]
/// or [`Cache::purge_expired`].
///
/// Operations on the same key are serialised; operations on different keys
/// only contend when their ids share a lock stripe. `clear` and
/// `purge_expired` exclude every other operation while they run.
pub struct Cache {
    store: EntryStore,
    policy: ExpirationPolicy,
    /// Shared by key operations, exclusive for whole-directory operations
    dir_lock: RwLock<()>,
    stripes: [Mutex<()>; LOCK_STRIPES],
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
    claim: DirectoryClaim,
}

impl Cache {
    /// Open a cache, creating its directory if needed.
    ///
    /// Fails with [`CacheError::DirectoryInUse`](crate::CacheError::DirectoryInUse)
    /// if another live instance in this process owns the same directory.
    pub fn open(config: CacheConfig) -> Result<Self> {
        let store = EntryStore::open(&config.cache_dir)?;
        let claim = DirectoryClaim::acquire(store.dir())?;
        let policy = ExpirationPolicy::from_secs(config.default_ttl_secs);

        info!(
            cache_dir = ?config.cache_dir,
            default_ttl_secs = config.default_ttl_secs,
            "Cache initialized"
        );

        Ok(Self {
            store,
            policy,
            dir_lock: RwLock::new(()),
            stripes: std::array::from_fn(|_| Mutex::new(())),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            claim,
        })
    }

    /// Open a cache in `dir` with the default TTL of one day
    pub fn open_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(CacheConfig::new(dir))
    }

    /// The process-wide default instance, configured from the environment
    /// on first use (see [`CacheConfig::from_env`]).
    ///
    /// Prefer constructing a [`Cache`] and passing it around; this exists for
    /// callers that want one shared cache without threading it through.
    pub fn shared() -> Result<Arc<Cache>> {
        Self::shared_in(&SHARED, CacheConfig::from_env)
    }

    /// Return the instance held in `slot`, opening one from `config` if the
    /// slot is empty. A failed open leaves the slot empty.
    fn shared_in(
        slot: &Mutex<Option<Arc<Cache>>>,
        config: impl FnOnce() -> CacheConfig,
    ) -> Result<Arc<Cache>> {
        let mut slot = mutex_lock(slot);
        if let Some(cache) = slot.as_ref() {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(Cache::open(config())?);
        *slot = Some(Arc::clone(&cache));
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        self.store.dir()
    }

    /// TTL applied by writes that do not pass one
    pub fn default_timeout_interval(&self) -> Duration {
        self.policy.default_ttl()
    }

    /// Change the default TTL. Entries already written keep their deadline.
    pub fn set_default_timeout_interval(&self, ttl: Duration) {
        self.policy.set_default_ttl(ttl);
    }

    /// Store `payload` under `key` with the current default TTL
    pub fn set(&self, key: &str, payload: &[u8]) -> Result<()> {
        self.write(key, payload, None)
    }

    /// Store `payload` under `key`, expiring after `ttl`.
    ///
    /// A zero or negative TTL still writes the entry; it reads as absent.
    pub fn set_with_ttl(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()> {
        self.write(key, payload, Some(ttl))
    }

    fn write(&self, key: &str, payload: &[u8], ttl: Option<Duration>) -> Result<()> {
        let id = StorageId::for_key(key)?;
        let deadline = self.policy.compute_deadline(Utc::now(), ttl);

        let _dir = rw_read(&self.dir_lock);
        let _stripe = self.lock_stripe(&id);
        self.store.put(&id, key, payload, deadline)?;
        debug!(key = %id, size = payload.len(), expires_at = %deadline, "Cached entry");
        Ok(())
    }

    /// Payload for `key`, or `None` if absent or expired
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let id = StorageId::for_key(key)?;

        let _dir = rw_read(&self.dir_lock);
        let _stripe = self.lock_stripe(&id);

        let entry = match self.store.get(&id)? {
            Some(entry) => entry,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %id, "Cache miss");
                return Ok(None);
            }
        };

        if !ExpirationPolicy::is_valid(entry.expires_at, Utc::now()) {
            debug!(key = %id, expires_at = %entry.expires_at, "Cache entry expired");
            self.store.remove(&id)?;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key = %id, "Cache hit");
        Ok(Some(entry.payload))
    }

    /// Whether `key` holds an unexpired entry; reclaims it if expired
    pub fn has(&self, key: &str) -> Result<bool> {
        let id = StorageId::for_key(key)?;

        let _dir = rw_read(&self.dir_lock);
        let _stripe = self.lock_stripe(&id);

        let Some(header) = self.store.peek(&id)? else {
            return Ok(false);
        };
        if ExpirationPolicy::is_valid(header.expires_at, Utc::now()) {
            return Ok(true);
        }

        debug!(key = %id, expires_at = %header.expires_at, "Cache entry expired");
        self.store.remove(&id)?;
        Ok(false)
    }

    /// Delete `key`. Absent keys are not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let id = StorageId::for_key(key)?;

        let _dir = rw_read(&self.dir_lock);
        let _stripe = self.lock_stripe(&id);
        if self.store.remove(&id)? {
            debug!(key = %id, "Removed entry");
        }
        Ok(())
    }

    /// Stored deadline for `key`, expired or not
    pub fn expiration_date(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.entry_info(key)?.map(|info| info.expires_at))
    }

    /// Header details for `key`, expired or not, without reading the payload
    pub fn entry_info(&self, key: &str) -> Result<Option<EntryInfo>> {
        let id = StorageId::for_key(key)?;

        let _dir = rw_read(&self.dir_lock);
        let _stripe = self.lock_stripe(&id);
        Ok(self.store.peek(&id)?.map(|header| EntryInfo {
            key: header.key,
            storage_id: id.to_string(),
            expires_at: header.expires_at,
            size: header.size,
        }))
    }

    /// Keys of every unexpired entry, in no particular order.
    ///
    /// Expired entries are skipped but not reclaimed.
    pub fn all_keys(&self) -> Result<Vec<String>> {
        let _dir = rw_read(&self.dir_lock);
        let now = Utc::now();

        let mut keys = Vec::new();
        for id in self.store.all_ids()? {
            let _stripe = self.lock_stripe(&id);
            if let Some(header) = self.store.peek(&id)? {
                if ExpirationPolicy::is_valid(header.expires_at, now) {
                    keys.push(header.key);
                }
            }
        }
        Ok(keys)
    }

    /// Store a copy of the file at `path` under `key` with the default TTL
    pub fn copy_file(&self, path: impl AsRef<Path>, key: &str) -> Result<()> {
        self.copy_file_inner(path.as_ref(), key, None)
    }

    /// Store a copy of the file at `path` under `key`, expiring after `ttl`
    pub fn copy_file_with_ttl(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        ttl: Duration,
    ) -> Result<()> {
        self.copy_file_inner(path.as_ref(), key, Some(ttl))
    }

    fn copy_file_inner(&self, path: &Path, key: &str, ttl: Option<Duration>) -> Result<()> {
        StorageId::for_key(key)?;
        let payload = std::fs::read(path)?;
        debug!(source = ?path, size = payload.len(), "Copying file into cache");
        self.write(key, &payload, ttl)
    }

    /// Remove every entry. Blocks all other operations until the directory is
    /// empty, which can take a while for large caches.
    pub fn clear(&self) -> Result<()> {
        let _dir = rw_write(&self.dir_lock);
        let removed = self.store.clear()?;
        info!(cache_dir = ?self.store.dir(), removed, "Cache cleared");
        Ok(())
    }

    /// Delete every expired entry now instead of waiting for it to be read.
    /// Returns how many were removed. Blocks other operations while it runs.
    pub fn purge_expired(&self) -> Result<usize> {
        let _dir = rw_write(&self.dir_lock);
        let now = Utc::now();

        let mut removed = 0;
        for id in self.store.all_ids()? {
            let Some(header) = self.store.peek(&id)? else {
                continue;
            };
            if !ExpirationPolicy::is_valid(header.expires_at, now) && self.store.remove(&id)? {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Purged expired cache entries");
        }
        Ok(removed)
    }

    /// Get current cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let (entries, total_size) = {
            let _dir = rw_read(&self.dir_lock);
            self.store.disk_usage()?
        };
        Ok(CacheStats {
            entries,
            total_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        })
    }

    fn lock_stripe(&self, id: &StorageId) -> MutexGuard<'_, ()> {
        mutex_lock(&self.stripes[id.stripe(LOCK_STRIPES)])
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("dir", &self.claim.path())
            .field("default_ttl", &self.policy.default_ttl())
            .finish_non_exhaustive()
    }
}

// A panic while holding one of these locks leaves no partial state behind:
// entry files are only ever published by rename.

fn rw_read(lock: &RwLock<()>) -> RwLockReadGuard<'_, ()> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!(lock_kind = "rwlock.read", "Recovered from poisoned cache lock");
        poisoned.into_inner()
    })
}

fn rw_write(lock: &RwLock<()>) -> RwLockWriteGuard<'_, ()> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(lock_kind = "rwlock.write", "Recovered from poisoned cache lock");
        poisoned.into_inner()
    })
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!(lock_kind = "mutex.lock", "Recovered from poisoned cache lock");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use std::thread;
    use tempfile::tempdir;

    fn open(dir: &tempfile::TempDir) -> Cache {
        Cache::open_dir(dir.path()).unwrap()
    }

    #[test]
    fn test_cache_set_and_get() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        let payload = b"{\"name\":\"a\"}";
        cache
            .set_with_ttl("user:42", payload, Duration::seconds(86400))
            .unwrap();

        assert_eq!(cache.get("user:42").unwrap().as_deref(), Some(&payload[..]));

        let deadline = cache.expiration_date("user:42").unwrap().unwrap();
        let expected = Utc::now() + Duration::seconds(86400);
        assert!((deadline - expected).num_seconds().abs() <= 5);
    }

    #[test]
    fn test_cache_miss() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        assert!(cache.get("nonexistent").unwrap().is_none());
        assert!(!cache.has("nonexistent").unwrap());
        assert!(cache.expiration_date("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_empty_key_rejected() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        assert!(matches!(cache.set("", b"x"), Err(CacheError::InvalidKey)));
        assert!(matches!(cache.get(""), Err(CacheError::InvalidKey)));
        assert!(matches!(cache.has(""), Err(CacheError::InvalidKey)));
        assert!(matches!(cache.remove(""), Err(CacheError::InvalidKey)));
    }

    #[test]
    fn test_zero_ttl_expires() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set_with_ttl("k", b"v", Duration::zero()).unwrap();
        // The write itself succeeds
        assert!(cache.expiration_date("k").unwrap().is_some());

        thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.get("k").unwrap().is_none());
        assert!(!cache.has("k").unwrap());
    }

    #[test]
    fn test_get_reclaims_expired_entry() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set_with_ttl("k", b"v", Duration::seconds(-1)).unwrap();
        assert_eq!(cache.stats().unwrap().entries, 1);

        assert!(cache.get("k").unwrap().is_none());
        assert_eq!(cache.stats().unwrap().entries, 0);
        assert!(cache.expiration_date("k").unwrap().is_none());
    }

    #[test]
    fn test_has_reclaims_expired_entry() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set_with_ttl("k", b"v", Duration::seconds(-1)).unwrap();
        assert!(!cache.has("k").unwrap());
        assert_eq!(cache.stats().unwrap().entries, 0);
    }

    #[test]
    fn test_overwrite() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set("k", b"first value, longer").unwrap();
        cache.set("k", b"p2").unwrap();
        assert_eq!(cache.get("k").unwrap().unwrap(), b"p2");
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set("k", b"v").unwrap();
        cache.remove("k").unwrap();
        assert!(cache.get("k").unwrap().is_none());
        assert!(!cache.has("k").unwrap());

        // Removing again is fine
        cache.remove("k").unwrap();
        cache.remove("never-set").unwrap();
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        let keys: Vec<String> = (0..10).map(|i| format!("key:{}", i)).collect();
        for key in &keys {
            cache.set(key, key.as_bytes()).unwrap();
        }
        assert_eq!(cache.all_keys().unwrap().len(), 10);

        cache.clear().unwrap();
        assert!(cache.all_keys().unwrap().is_empty());
        for key in &keys {
            assert!(cache.get(key).unwrap().is_none());
        }

        // Clearing an empty cache is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_all_keys_returns_original_keys() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set("alpha", b"1").unwrap();
        cache.set("beta/with/slashes", b"2").unwrap();
        cache.set("γ", b"3").unwrap();
        cache.set_with_ttl("expired", b"4", Duration::seconds(-1)).unwrap();

        let mut keys = cache.all_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["alpha", "beta/with/slashes", "γ"]);

        // Enumeration does not reclaim
        assert!(cache.entry_info("expired").unwrap().is_some());
    }

    #[test]
    fn test_default_ttl_mutation_not_retroactive() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);
        assert_eq!(cache.default_timeout_interval(), Duration::days(1));

        cache.set("before", b"v").unwrap();
        let before = cache.expiration_date("before").unwrap().unwrap();

        cache.set_default_timeout_interval(Duration::seconds(60));
        cache.set("after", b"v").unwrap();

        assert_eq!(cache.expiration_date("before").unwrap().unwrap(), before);
        let after = cache.expiration_date("after").unwrap().unwrap();
        assert!(after < before);
        assert!((after - Utc::now()).num_seconds() <= 60);

        cache.set_default_timeout_interval(Duration::seconds(-1));
        cache.set("immediately-stale", b"v").unwrap();
        assert!(cache.get("immediately-stale").unwrap().is_none());
    }

    #[test]
    fn test_entry_info() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set("k", b"0123456789").unwrap();
        let info = cache.entry_info("k").unwrap().unwrap();
        assert_eq!(info.key, "k");
        assert_eq!(info.size, 10);
        assert_eq!(info.storage_id, StorageId::for_key("k").unwrap().to_string());
    }

    #[test]
    fn test_copy_file() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);
        let source_dir = tempdir().unwrap();
        let source = source_dir.path().join("report.pdf");
        std::fs::write(&source, b"%PDF-1.7 fake").unwrap();

        cache.copy_file(&source, "report").unwrap();
        assert_eq!(cache.get("report").unwrap().unwrap(), b"%PDF-1.7 fake");

        // The source is left alone
        assert!(source.exists());

        cache
            .copy_file_with_ttl(&source, "report", Duration::seconds(-1))
            .unwrap();
        assert!(cache.get("report").unwrap().is_none());
    }

    #[test]
    fn test_copy_missing_file_fails() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        let result = cache.copy_file(dir.path().join("missing"), "k");
        assert!(matches!(result, Err(CacheError::Io(_))));
        assert!(!cache.has("k").unwrap());
    }

    #[test]
    fn test_purge_expired() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        cache.set("fresh", b"v").unwrap();
        cache.set_with_ttl("stale1", b"v", Duration::seconds(-1)).unwrap();
        cache.set_with_ttl("stale2", b"v", Duration::zero()).unwrap();

        thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(cache.purge_expired().unwrap(), 2);
        assert_eq!(cache.stats().unwrap().entries, 1);
        assert!(cache.has("fresh").unwrap());
    }

    #[test]
    fn test_cache_hit_miss_counters() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        // Miss
        cache.get("k").unwrap();
        let stats = cache.stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);

        // Put and hit
        cache.set("k", b"data").unwrap();
        cache.get("k").unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
        assert!(stats.total_size > 4);
    }

    #[test]
    fn test_survives_restart() {
        let dir = tempdir().unwrap();
        {
            let cache = open(&dir);
            cache.set("k", b"persisted").unwrap();
        }

        let cache = open(&dir);
        assert_eq!(cache.get("k").unwrap().unwrap(), b"persisted");
        assert_eq!(cache.all_keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_directory_exclusive_per_instance() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);

        let second = Cache::open_dir(dir.path());
        assert!(matches!(second, Err(CacheError::DirectoryInUse(_))));

        drop(cache);
        assert!(Cache::open_dir(dir.path()).is_ok());
    }

    #[test]
    fn test_open_with_huge_default_ttl() {
        let dir = tempdir().unwrap();
        let cache = Cache::open(CacheConfig {
            cache_dir: dir.path().to_path_buf(),
            default_ttl_secs: i64::MAX,
        })
        .unwrap();
        assert_eq!(cache.default_timeout_interval(), Duration::MAX);

        cache.set("k", b"v").unwrap();
        assert_eq!(cache.get("k").unwrap().unwrap(), b"v");
        drop(cache);

        let cache = Cache::open(CacheConfig {
            cache_dir: dir.path().to_path_buf(),
            default_ttl_secs: i64::MIN,
        })
        .unwrap();
        cache.set("k", b"v").unwrap();
        assert!(cache.get("k").unwrap().is_none());
    }

    #[test]
    fn test_shared_instance_reused() {
        let dir = tempdir().unwrap();
        let slot = Mutex::new(None);

        let first = Cache::shared_in(&slot, || CacheConfig::new(dir.path())).unwrap();
        let second = Cache::shared_in(&slot, || panic!("slot already filled")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        first.set("k", b"v").unwrap();
        assert_eq!(second.get("k").unwrap().unwrap(), b"v");
    }

    #[test]
    fn test_shared_instance_retries_after_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let slot = Mutex::new(None);

        let failed = Cache::shared_in(&slot, || CacheConfig::new(&blocker));
        assert!(matches!(failed, Err(CacheError::Io(_))));
        assert!(mutex_lock(&slot).is_none());

        let cache = Cache::shared_in(&slot, || CacheConfig::new(dir.path().join("cache"))).unwrap();
        assert!(cache.dir().ends_with("cache"));
        assert!(mutex_lock(&slot).is_some());
    }

    #[test]
    fn test_debug_shows_claimed_dir() {
        let dir = tempdir().unwrap();
        let cache = open(&dir);
        let debug_str = format!("{:?}", cache);
        assert!(debug_str.contains("Cache"));
        assert!(debug_str.contains("dir"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache = Cache::open_dir(&nested).unwrap();

        cache.set("k", b"v").unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(open(&dir));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..25 {
                        let key = format!("thread:{}:item:{}", t, i);
                        cache.set(&key, key.as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..8 {
            for i in 0..25 {
                let key = format!("thread:{}:item:{}", t, i);
                assert_eq!(cache.get(&key).unwrap().unwrap(), key.as_bytes());
            }
        }
        assert_eq!(cache.all_keys().unwrap().len(), 200);
    }

    #[test]
    fn test_concurrent_same_key_never_torn() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(open(&dir));
        let small = vec![b'a'; 16];
        let large = vec![b'b'; 64 * 1024];

        let writers: Vec<_> = [small.clone(), large.clone()]
            .into_iter()
            .map(|payload| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..50 {
                        cache.set("shared", &payload).unwrap();
                    }
                })
            })
            .collect();

        let reader = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Some(value) = cache.get("shared").unwrap() {
                        assert!(value == small || value == large);
                    }
                }
            })
        };

        for handle in writers {
            handle.join().unwrap();
        }
        reader.join().unwrap();
    }

    #[test]
    fn test_clear_while_writing() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(open(&dir));

        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100 {
                    cache.set(&format!("k{}", i), b"v").unwrap();
                }
            })
        };
        for _ in 0..5 {
            cache.clear().unwrap();
        }
        writer.join().unwrap();

        cache.clear().unwrap();
        assert!(cache.all_keys().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
