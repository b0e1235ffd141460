//! Process-local ownership of cache directories

use crate::error::{CacheError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use tracing::debug;

static CLAIMED_DIRS: LazyLock<Mutex<HashSet<PathBuf>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Exclusive claim on a directory, released on drop.
///
/// Only guards against two instances in the same process; other processes
/// are not coordinated with.
#[derive(Debug)]
pub struct DirectoryClaim {
    path: PathBuf,
}

impl DirectoryClaim {
    /// Claim an existing directory by its canonical path
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.canonicalize()?;
        let mut claimed = CLAIMED_DIRS.lock().unwrap_or_else(|e| e.into_inner());
        if !claimed.insert(path.clone()) {
            return Err(CacheError::DirectoryInUse(path));
        }
        debug!(cache_dir = ?path, "Claimed cache directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirectoryClaim {
    fn drop(&mut self) {
        let mut claimed = CLAIMED_DIRS.lock().unwrap_or_else(|e| e.into_inner());
        claimed.remove(&self.path);
    }
}
