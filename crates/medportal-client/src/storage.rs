//! Durable storage for the persisted session marker.
//!
//! The marker is a cache hint ("this client was logged in last time"), never
//! proof of authentication. In the bearer deployment the stored token doubles
//! as the marker.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt marker file {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Key/value storage for the persisted marker.
pub trait MarkerStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`, returning whether anything was discarded.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}

/// Process-local store. Forgets everything when the process exits.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }
}

/// JSON file holding the marker entries, one file per profile.
#[derive(Debug)]
pub struct FileMarkerStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// `<dir>/session.<profile>.json`
    pub fn for_profile(dir: &Path, profile: &str) -> Self {
        Self::new(dir.join(format!("session.{profile}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Like `load`, but a corrupt file is treated as empty so writes can
    /// replace it. The flag reports whether the file was corrupt.
    fn load_for_write(&self) -> Result<(HashMap<String, String>, bool), StorageError> {
        match self.load() {
            Ok(entries) => Ok((entries, false)),
            Err(e @ StorageError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "Discarding corrupt marker file");
                Ok((HashMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if entries.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl MarkerStore for FileMarkerStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        let (mut entries, _) = self.load_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        let (mut entries, corrupt) = self.load_for_write()?;
        let removed = entries.remove(key).is_some();
        if removed || corrupt {
            self.save(&entries)?;
        }
        Ok(removed || corrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryMarkerStore::new();
        assert!(!store.contains("token"));

        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
        assert!(store.remove("token").unwrap());
        assert!(!store.remove("token").unwrap());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::for_profile(dir.path(), "default");
        store.set("authenticated", "true").unwrap();

        let reopened = FileMarkerStore::for_profile(dir.path(), "default");
        assert_eq!(
            reopened.get("authenticated").unwrap().as_deref(),
            Some("true")
        );

        let other = FileMarkerStore::for_profile(dir.path(), "staging");
        assert!(!other.contains("authenticated"));
    }

    #[test]
    fn test_file_store_removes_file_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::for_profile(dir.path(), "default");
        store.set("token", "abc").unwrap();
        assert!(store.path().exists());

        assert!(store.remove("token").unwrap());
        assert!(!store.path().exists());
        assert!(!store.remove("token").unwrap());
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::for_profile(dir.path(), "default");
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(
            store.get("token"),
            Err(StorageError::Corrupt { .. })
        ));
        assert!(!store.contains("token"));
    }

    #[test]
    fn test_file_store_replaces_corrupt_file_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::for_profile(dir.path(), "default");
        fs::write(store.path(), "{\"token\": ").unwrap();

        store.set("token", "fresh").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_file_store_remove_clears_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMarkerStore::for_profile(dir.path(), "default");
        fs::write(store.path(), "not json").unwrap();

        assert!(store.remove("token").unwrap());
        assert!(!store.path().exists());
        assert_eq!(store.get("token").unwrap(), None);
    }
}
