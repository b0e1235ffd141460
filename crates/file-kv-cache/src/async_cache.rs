//! Tokio adapter for async callers
//!
//! Cache operations block on filesystem I/O, so each call is moved onto
//! tokio's blocking pool rather than run on an async worker thread.

use crate::cache::Cache;
use crate::error::{CacheError, Result};
use crate::types::{CacheStats, EntryInfo};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Cloneable async handle to a shared [`Cache`]
#[derive(Debug, Clone)]
pub struct AsyncCache {
    inner: Arc<Cache>,
}

impl AsyncCache {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { inner: cache }
    }

    /// The underlying blocking cache
    pub fn blocking(&self) -> &Arc<Cache> {
        &self.inner
    }

    /// TTL applied by writes that do not pass one
    pub fn default_timeout_interval(&self) -> Duration {
        self.inner.default_timeout_interval()
    }

    /// Change the default TTL for later writes
    pub fn set_default_timeout_interval(&self, ttl: Duration) {
        self.inner.set_default_timeout_interval(ttl);
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Cache) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let cache = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&cache))
            .await
            .map_err(|e| CacheError::Io(Box::new(std::io::Error::other(e))))?
    }

    pub async fn set(&self, key: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<()> {
        let (key, payload) = (key.into(), payload.into());
        self.run(move |cache| cache.set(&key, &payload)).await
    }

    pub async fn set_with_ttl(
        &self,
        key: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        ttl: Duration,
    ) -> Result<()> {
        let (key, payload) = (key.into(), payload.into());
        self.run(move |cache| cache.set_with_ttl(&key, &payload, ttl))
            .await
    }

    pub async fn get(&self, key: impl Into<String>) -> Result<Option<Vec<u8>>> {
        let key = key.into();
        self.run(move |cache| cache.get(&key)).await
    }

    pub async fn has(&self, key: impl Into<String>) -> Result<bool> {
        let key = key.into();
        self.run(move |cache| cache.has(&key)).await
    }

    pub async fn remove(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.run(move |cache| cache.remove(&key)).await
    }

    pub async fn expiration_date(&self, key: impl Into<String>) -> Result<Option<DateTime<Utc>>> {
        let key = key.into();
        self.run(move |cache| cache.expiration_date(&key)).await
    }

    pub async fn entry_info(&self, key: impl Into<String>) -> Result<Option<EntryInfo>> {
        let key = key.into();
        self.run(move |cache| cache.entry_info(&key)).await
    }

    pub async fn all_keys(&self) -> Result<Vec<String>> {
        self.run(|cache| cache.all_keys()).await
    }

    pub async fn copy_file(&self, path: impl Into<PathBuf>, key: impl Into<String>) -> Result<()> {
        let (path, key) = (path.into(), key.into());
        self.run(move |cache| cache.copy_file(&path, &key)).await
    }

    pub async fn copy_file_with_ttl(
        &self,
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        ttl: Duration,
    ) -> Result<()> {
        let (path, key) = (path.into(), key.into());
        self.run(move |cache| cache.copy_file_with_ttl(&path, &key, ttl))
            .await
    }

    pub async fn clear(&self) -> Result<()> {
        self.run(|cache| cache.clear()).await
    }

    pub async fn purge_expired(&self) -> Result<usize> {
        self.run(|cache| cache.purge_expired()).await
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.run(|cache| cache.stats()).await
    }
}

impl From<Arc<Cache>> for AsyncCache {
    fn from(cache: Arc<Cache>) -> Self {
        Self::new(cache)
    }
}
