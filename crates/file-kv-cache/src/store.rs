//! On-disk entry storage
//!
//! Each entry is one file in a flat directory, named by its [`StorageId`]:
//!
//! ```text
//! +------+-------------------+--------------+-----------+-----------------+
//! | FKV1 | deadline (i64 BE, | key len      | key bytes | payload bytes   |
//! |      | unix millis)      | (u32 BE)     | (UTF-8)   | (rest of file)  |
//! +------+-------------------+--------------+-----------+-----------------+
//! ```
//!
//! The deadline travels in the same file as the payload, so the two are
//! always published and removed together. Writes go to a dot-prefixed temp
//! file in the same directory and are renamed into place.

use crate::error::Result;
use crate::key::StorageId;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MAGIC: &[u8; 4] = b"FKV1";
const FIXED_HEADER_LEN: usize = 4 + 8 + 4;
const TEMP_PREFIX: &str = ".tmp-";

/// Header fields of a stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub key: String,
    pub expires_at: DateTime<Utc>,
    /// Payload length in bytes
    pub size: u64,
}

/// A fully loaded entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: String,
    pub expires_at: DateTime<Utc>,
    pub payload: Vec<u8>,
}

/// Byte-level entry storage rooted at one directory.
///
/// Does not apply expiration; callers decide what a deadline means.
#[derive(Debug)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    /// Open a store, creating the directory if it is absent
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &StorageId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    /// Write an entry, replacing any previous one for the same id in full
    pub fn put(
        &self,
        id: &StorageId,
        key: &str,
        payload: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)?;

        tmp.write_all(&encode_header(key, expires_at)?)?;
        tmp.write_all(payload)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        tmp.persist(self.path_for(id))?;
        debug!(key = %id, size = payload.len(), "Stored entry");
        Ok(())
    }

    /// Load an entry with its raw deadline.
    ///
    /// Files that fail to parse are removed and reported as absent.
    pub fn get(&self, id: &StorageId) -> Result<Option<StoredEntry>> {
        let path = self.path_for(id);
        let mut bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file_len = bytes.len() as u64;
        let header = match read_header(&mut bytes.as_slice(), id, file_len) {
            Ok(header) => header,
            Err(e) if is_corruption(&e) => {
                self.discard_corrupt(id, &e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let payload = bytes.split_off(bytes.len() - header.size as usize);
        Ok(Some(StoredEntry {
            key: header.key,
            expires_at: header.expires_at,
            payload,
        }))
    }

    /// Read only the header of an entry
    pub fn peek(&self, id: &StorageId) -> Result<Option<EntryHeader>> {
        let file = match File::open(self.path_for(id)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file_len = file.metadata()?.len();

        match read_header(&mut BufReader::new(file), id, file_len) {
            Ok(header) => Ok(Some(header)),
            Err(e) if is_corruption(&e) => {
                self.discard_corrupt(id, &e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an entry; returns whether one was present
    pub fn remove(&self, id: &StorageId) -> Result<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a file for the id is present, regardless of validity
    pub fn exists(&self, id: &StorageId) -> Result<bool> {
        Ok(self.path_for(id).try_exists()?)
    }

    /// Every entry file currently present, in directory order
    pub fn all_ids(&self) -> Result<Vec<StorageId>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if let Some(id) = dir_entry.file_name().to_str().and_then(StorageId::from_file_name) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Number of entry files and their combined size on disk
    pub fn disk_usage(&self) -> Result<(usize, u64)> {
        let mut entries = 0;
        let mut total_size = 0;
        for id in self.all_ids()? {
            match fs::metadata(self.path_for(&id)) {
                Ok(meta) => {
                    entries += 1;
                    total_size += meta.len();
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok((entries, total_size))
    }

    /// Remove every entry and any leftover temp file. Blocks until done.
    pub fn clear(&self) -> Result<usize> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else { continue };

            let is_entry = StorageId::from_file_name(name).is_some();
            if !is_entry && !name.starts_with(TEMP_PREFIX) {
                continue;
            }

            match fs::remove_file(dir_entry.path()) {
                Ok(()) if is_entry => removed += 1,
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    fn discard_corrupt(&self, id: &StorageId, err: &io::Error) {
        warn!(key = %id, error = %err, "Failed to parse cached file, removing entry");
        if let Err(e) = fs::remove_file(self.path_for(id)) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(key = %id, error = %e, "Failed to remove corrupt entry");
            }
        }
    }
}

fn encode_header(key: &str, expires_at: DateTime<Utc>) -> io::Result<Vec<u8>> {
    let key_len = u32::try_from(key.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "key too long"))?;

    let mut header = Vec::with_capacity(FIXED_HEADER_LEN + key.len());
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&expires_at.timestamp_millis().to_be_bytes());
    header.extend_from_slice(&key_len.to_be_bytes());
    header.extend_from_slice(key.as_bytes());
    Ok(header)
}

fn read_header(reader: &mut impl Read, id: &StorageId, file_len: u64) -> io::Result<EntryHeader> {
    let mut fixed = [0u8; FIXED_HEADER_LEN];
    reader.read_exact(&mut fixed)?;

    if &fixed[..4] != MAGIC {
        return Err(corrupt("bad magic"));
    }

    let mut millis = [0u8; 8];
    millis.copy_from_slice(&fixed[4..12]);
    let expires_at = DateTime::from_timestamp_millis(i64::from_be_bytes(millis))
        .ok_or_else(|| corrupt("deadline out of range"))?;

    let mut key_len = [0u8; 4];
    key_len.copy_from_slice(&fixed[12..16]);
    let key_len = u64::from(u32::from_be_bytes(key_len));

    let header_len = FIXED_HEADER_LEN as u64 + key_len;
    if header_len > file_len {
        return Err(corrupt("key length exceeds file"));
    }

    let mut key = vec![0u8; key_len as usize];
    reader.read_exact(&mut key)?;
    let key = String::from_utf8(key).map_err(|_| corrupt("key is not UTF-8"))?;

    if StorageId::for_key(&key).ok().as_ref() != Some(id) {
        return Err(corrupt("key does not match file name"));
    }

    Ok(EntryHeader {
        key,
        expires_at,
        size: file_len - header_len,
    })
}

fn corrupt(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn is_corruption(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
    )
}
