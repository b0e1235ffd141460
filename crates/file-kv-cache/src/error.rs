//! Error types for the file-backed key/value cache

use std::fmt;
use std::path::PathBuf;

/// Failures a cache operation can report.
///
/// A missing or expired key is not an error; read paths return `None` for it.
#[derive(Debug)]
pub enum CacheError {
    /// The caller passed an empty key
    InvalidKey,
    /// The filesystem refused a read, write, or delete
    Io(Box<std::io::Error>),
    /// A typed adapter could not encode or decode a payload
    Encoding(String),
    /// Another live instance in this process already owns the directory
    DirectoryInUse(PathBuf),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidKey => write!(f, "Invalid key: cache keys must not be empty"),
            CacheError::Io(err) => write!(f, "IO error: {}", err),
            CacheError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            CacheError::DirectoryInUse(path) => {
                write!(f, "Cache directory already in use: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Encoding(err.to_string())
    }
}

impl From<tempfile::PersistError> for CacheError {
    fn from(err: tempfile::PersistError) -> Self {
        CacheError::Io(Box::new(err.error))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
