//! Durable session state storage.
//!
//! The session store persists the bearer token and the serialized profile
//! under fixed string keys on every mutation, and restores them at startup.
//! Reads and writes are synchronous and atomic per call.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Storage keys for persisted session state.
///
/// The key names are part of the on-disk contract and match what the
/// deployed application shells already wrote.
pub mod keys {
    /// Key for the raw bearer token string.
    pub const TOKEN: &str = "token";

    /// Key for the JSON-serialized user profile.
    pub const USER_INFO: &str = "userInfo";
}

/// Errors that can occur reading or writing durable state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file contents are not valid JSON.
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable string-keyed state storage.
///
/// Implementations must be effectively atomic per call: a `get` observes
/// either the state before or after any concurrent `set`, never a torn
/// value.
pub trait StateStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing an absent key is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed storage: a single JSON object on disk.
///
/// Writes go to a sibling temp file and are renamed into place, so a crash
/// mid-write never leaves a torn state file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create storage backed by the file at `path`. The file and its parent
    /// directories are created lazily on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = tmp_path(&self.path);
        std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

impl StateStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.load()?;
        map.insert(key.to_owned(), value.to_owned());
        self.store(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.store(&map)?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "studyhall-storage-{}-{name}.json",
            std::process::id()
        ))
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("token").unwrap(), None);

        storage.set("token", "tok-123").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("tok-123"));

        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);

        // Removing an absent key is a no-op
        storage.remove("token").unwrap();
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let path = scratch_file("roundtrip");
        let _ = std::fs::remove_file(&path);

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get(keys::TOKEN).unwrap(), None);

        storage.set(keys::TOKEN, "tok-abc").unwrap();
        storage.set(keys::USER_INFO, "{\"id\":1}").unwrap();

        // A fresh handle over the same file sees the persisted values
        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get(keys::TOKEN).unwrap().as_deref(),
            Some("tok-abc")
        );

        reopened.remove(keys::TOKEN).unwrap();
        assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
        assert_eq!(
            storage.get(keys::USER_INFO).unwrap().as_deref(),
            Some("{\"id\":1}")
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let storage = FileStorage::new(scratch_file("missing"));
        assert_eq!(storage.get("anything").unwrap(), None);
    }
}
