//! Persistent key/value storage for session state
//!
//! Values are plain strings: a raw token or a JSON blob. Anything read back is
//! treated as untrusted input.

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

/// Raw bearer token
pub const TOKEN_KEY: &str = "token";

/// Internal profile record (`User`)
pub const USER_KEY: &str = "user";

/// External account identity (`AccountUser`)
pub const ACCOUNT_USER_KEY: &str = "accountUser";

/// The organizer's currently displayed check-in code
pub const ACTIVE_CHECK_IN_CODE_KEY: &str = "activeCheckInCode";

/// Keys removed when the session ends
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, USER_KEY, ACCOUNT_USER_KEY];

/// Keyed string storage surviving restarts.
///
/// Writes are fire-and-forget: implementations log failures instead of
/// returning them, so callers never have to handle a storage fault.
pub trait SessionStorage: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str);

    /// Remove a value
    fn remove(&self, key: &str);

    /// Whether a value exists for `key`
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Decode a JSON blob stored under `key`.
///
/// A value that fails to parse is removed and reported as absent.
pub fn read_json<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding malformed `{}` from storage: {}", key, e);
            storage.remove(key);
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key`
pub fn write_json<T: Serialize>(storage: &dyn SessionStorage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.set(key, &raw),
        Err(e) => warn!("Failed to serialize `{}` for storage: {}", key, e),
    }
}

/// Remove every session key
pub fn clear_session(storage: &dyn SessionStorage) {
    for key in SESSION_KEYS {
        storage.remove(key);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Storage kept only in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.entries).insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        lock(&self.entries).remove(key);
    }
}

/// Storage backed by a JSON object file on disk.
///
/// The whole file is rewritten on every change through a sibling temp file
/// and a rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// An unreadable or corrupt file starts the storage empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt storage file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::storage(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        debug!("Opened storage {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(Error::storage)?;
        fs::rename(&tmp, &self.path).map_err(Error::storage)?;
        Ok(())
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) {
        let mut entries = lock(&self.entries);
        if f(&mut entries) {
            if let Err(e) = self.flush(&entries) {
                warn!("Failed to persist {}: {}", self.path.display(), e);
            }
        }
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        });
    }

    fn remove(&self, key: &str) {
        self.mutate(|entries| entries.remove(key).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Blob {
        name: String,
    }

    #[test]
    fn test_read_json_discards_corrupt_value() {
        let storage = MemoryStorage::new();
        storage.set(USER_KEY, "{not json");

        let value: Option<Blob> = read_json(&storage, USER_KEY);
        assert!(value.is_none());
        assert!(!storage.contains(USER_KEY));
    }

    #[test]
    fn test_write_then_read_json() {
        let storage = MemoryStorage::new();
        write_json(&storage, USER_KEY, &Blob { name: "张三".into() });

        let value: Option<Blob> = read_json(&storage, USER_KEY);
        assert_eq!(value, Some(Blob { name: "张三".into() }));
    }

    #[test]
    fn test_clear_session_keeps_other_keys() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t");
        storage.set(USER_KEY, "{}");
        storage.set(ACCOUNT_USER_KEY, "{}");
        storage.set(ACTIVE_CHECK_IN_CODE_KEY, "{}");

        clear_session(&storage);

        assert_eq!(storage.len(), 1);
        assert!(storage.contains(ACTIVE_CHECK_IN_CODE_KEY));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set(TOKEN_KEY, "abc");
            storage.set(USER_KEY, "{\"id\":1}");
            storage.remove(USER_KEY);
        }

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("abc"));
        assert!(storage.get(USER_KEY).is_none());
    }

    #[test]
    fn test_file_storage_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get(TOKEN_KEY).is_none());

        storage.set(TOKEN_KEY, "fresh");
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("fresh"));
    }
}
