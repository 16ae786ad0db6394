//! Durable key/value storage for the bearer token.

use std::{
    collections::HashMap,
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;

/// The single key the client persists.
pub const TOKEN_KEY: &str = "token";

/// Failures writing or deleting a stored value.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("failed to access token storage at {path}: {source}")]
    Io {
        /// File that was being written or removed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A thread panicked while holding the in-memory map.
    #[error("token storage lock poisoned")]
    Poisoned,
}

/// Persistent string storage keyed by name.
///
/// Reads never fail: an unreadable entry is treated as absent.
pub trait TokenStorage: fmt::Debug + Send + Sync {
    /// Returns the stored value, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns an error if an existing value cannot be deleted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores each key as a file inside one directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

/// Writes `value` to a file only its owner can read, from the moment it exists.
fn write_private(path: &Path, value: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; an older file keeps its bits until now.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let contents = fs::read_to_string(self.entry_path(key)).ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key);
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        write_private(&path, value).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-process storage; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Creates storage pre-populated with a token.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(TOKEN_KEY.to_string(), token.to_string());
        }
        storage
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
