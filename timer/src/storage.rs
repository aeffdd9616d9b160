//! Durable key/value storage for the cycle store.
//!
//! The store persists one serialized record under a fixed key
//! ([`STORAGE_KEY`]). This module defines the storage boundary as the
//! [`KeyValueStorage`] trait and ships two implementations:
//!
//! - [`FileStorage`]: one JSON file per key inside a data directory.
//! - [`MemoryStorage`]: an in-memory map for tests and ephemeral sessions.
//!
//! # Atomic Writes
//!
//! [`FileStorage`] writes to a hidden temporary sibling and renames it over
//! the target, so a crash mid-write never leaves a truncated record behind.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::debug;

/// Key under which the session state is stored.
pub const STORAGE_KEY: &str = "@pomodoro-timer:cycles-state-1.0.0";

/// File extension used by [`FileStorage`].
const FILE_EXTENSION: &str = "json";

/// Errors that can occur while reading or writing storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading a stored item failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a stored item failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The record could not be serialized.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A synchronous string key/value store.
///
/// Implementations overwrite on [`set_item`](KeyValueStorage::set_item)
/// (last write wins) and return `Ok(None)` for keys that were never written.
pub trait KeyValueStorage: Send {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed storage rooted at a data directory.
///
/// Each key maps to `<dir>/<sanitized-key>.json`. The directory is created on
/// first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that backs `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pomodoro_timer::storage::{FileStorage, STORAGE_KEY};
    ///
    /// let storage = FileStorage::new("/tmp/pomodoro");
    /// assert_eq!(
    ///     storage.path_for(STORAGE_KEY).file_name().unwrap(),
    ///     "pomodoro-timer-cycles-state-1.0.0.json"
    /// );
    /// ```
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{FILE_EXTENSION}", sanitize_key(key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let temp_path = self
            .dir
            .join(format!(".{}.{FILE_EXTENSION}.tmp", sanitize_key(key)));
        fs::write(&temp_path, value).map_err(write_err)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(e));
        }

        debug!(path = %path.display(), bytes = value.len(), "Stored item");
        Ok(())
    }
}

/// In-memory storage.
///
/// Clones share the same underlying map, so a test can keep a handle and
/// inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one item.
    #[must_use]
    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.lock().insert(key.to_string(), value.to_string());
        storage
    }

    /// Returns a copy of the value under `key`.
    #[must_use]
    pub fn item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Number of successful [`set_item`](KeyValueStorage::set_item) calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.item(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Maps a storage key to a safe file stem.
///
/// Characters outside `[A-Za-z0-9._-]` become `-`; leading separators are
/// dropped so the file is not hidden.
fn sanitize_key(key: &str) -> String {
    let mapped: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = mapped.trim_start_matches(['-', '.']);
    if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_key_maps_storage_key() {
        assert_eq!(
            sanitize_key(STORAGE_KEY),
            "pomodoro-timer-cycles-state-1.0.0"
        );
    }

    #[test]
    fn sanitize_key_strips_path_components() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_key("@@@"), "item");
    }

    #[test]
    fn file_storage_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        assert!(storage.get_item(STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn file_storage_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("nested"));

        storage.set_item(STORAGE_KEY, r#"{"cycles":[]}"#).unwrap();
        assert_eq!(
            storage.get_item(STORAGE_KEY).unwrap().as_deref(),
            Some(r#"{"cycles":[]}"#)
        );
        assert!(storage.path_for(STORAGE_KEY).exists());
    }

    #[test]
    fn file_storage_overwrites_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set_item("k", "first").unwrap();
        storage.set_item("k", "second").unwrap();

        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("second"));
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "only the target file should remain");
    }

    #[test]
    fn file_storage_write_into_file_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let storage = FileStorage::new(&blocker);
        let err = storage.set_item("k", "v").unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[test]
    fn memory_storage_clones_share_items() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();

        storage.set_item("k", "v").unwrap();

        assert_eq!(handle.item("k").as_deref(), Some("v"));
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn memory_storage_with_item_does_not_count_as_write() {
        let storage = MemoryStorage::with_item("k", "v");
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.write_count(), 0);
    }
}
