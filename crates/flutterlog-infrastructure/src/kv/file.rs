//! File-backed key-value store with atomic writes.
//!
//! Each key lives in its own file under a base directory:
//!
//! ```text
//! {base_dir}/
//! ├── history_alice-1b4e28ba.json   # value of "history:alice"
//! ├── history_bob-9f0c2d11.json
//! └── plain-key.json                # keys made only of [A-Za-z0-9._-] map verbatim
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use flutterlog_core::error::{FlutterlogError, Result};
use flutterlog_core::kv::KeyValueStore;
use tracing::debug;
use uuid::Uuid;

const VALUE_EXTENSION: &str = "json";

/// Errors that can occur during file store operations.
#[derive(Debug)]
pub enum FileStoreError {
    /// File I/O error.
    IoError(std::io::Error),
    /// File locking error.
    LockError(String),
    /// The key cannot be mapped to a file name.
    InvalidKey(String),
}

impl std::fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStoreError::IoError(e) => write!(f, "I/O error: {}", e),
            FileStoreError::LockError(e) => write!(f, "Lock error: {}", e),
            FileStoreError::InvalidKey(key) => write!(f, "Invalid key: '{}'", key),
        }
    }
}

impl std::error::Error for FileStoreError {}

impl From<std::io::Error> for FileStoreError {
    fn from(e: std::io::Error) -> Self {
        FileStoreError::IoError(e)
    }
}

/// Maps a key to the file name holding its value.
///
/// Keys consisting only of `[A-Za-z0-9._-]` are used as-is. Any other
/// character is replaced with `_`, and a UUID v5 prefix of the original key is
/// appended so that distinct keys never share a file.
pub fn key_file_name(key: &str) -> std::result::Result<String, FileStoreError> {
    if key.is_empty() {
        return Err(FileStoreError::InvalidKey(key.to_string()));
    }

    let sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized == key && !key.starts_with('.') {
        return Ok(format!("{}.{}", key, VALUE_EXTENSION));
    }

    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).simple().to_string();
    Ok(format!(
        "{}-{}.{}",
        sanitized.trim_start_matches('.'),
        &digest[..8],
        VALUE_EXTENSION
    ))
}

/// A directory of values, one file per key.
///
/// Provides:
/// - **Atomicity**: writes go to a temp file, are fsynced, then renamed over the target
/// - **Isolation**: writers hold an exclusive lock on a sibling `.lock` file,
///   which is left in place so every writer locks the same inode
/// - **Durability**: `set` returns only after `sync_all`
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_dir: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `base_dir`. The directory is created lazily on first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the file holding `key`.
    pub fn value_path(&self, key: &str) -> std::result::Result<PathBuf, FileStoreError> {
        Ok(self.base_dir.join(key_file_name(key)?))
    }

    fn read(&self, key: &str) -> std::result::Result<Option<String>, FileStoreError> {
        let path = self.value_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn write(&self, key: &str, value: &str) -> std::result::Result<(), FileStoreError> {
        let path = self.value_path(key)?;
        fs::create_dir_all(&self.base_dir)?;

        let _lock = FileLock::acquire(&path)?;

        let tmp_path = temp_path(&path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(value.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("[FileKeyValueStore] Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> std::result::Result<(), FileStoreError> {
        let path = self.value_path(key)?;
        if !path.exists() {
            return Ok(());
        }

        let _lock = FileLock::acquire(&path)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(key)
            .map_err(|e| FlutterlogError::storage_read(key, e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, value)
            .map_err(|e| FlutterlogError::persistence(key, e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.delete(key)
            .map_err(|e| FlutterlogError::persistence(key, e.to_string()))
    }
}

/// Gets a temporary file path for atomic writes, in the same directory as `path`.
fn temp_path(path: &Path) -> std::result::Result<PathBuf, FileStoreError> {
    let parent = path.parent().ok_or_else(|| {
        FileStoreError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    let file_name = path.file_name().ok_or_else(|| {
        FileStoreError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no file name",
        ))
    })?;

    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// A file lock guard that releases the lock when dropped.
///
/// The lock file is never deleted: unlinking it would let a waiter hold a lock
/// on the orphaned inode while a new writer locks a fresh file.
struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> std::result::Result<Self, FileStoreError> {
        let lock_path = path.with_extension("lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| FileStoreError::LockError(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file })
    }
}
