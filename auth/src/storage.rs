//! Persistent key-value store with a durable and a tab-scoped tier.
//!
//! DESIGN
//! ======
//! `KeyValueStore` is a dumb string container: no validation, no knowledge of
//! what it holds. `MemoryStore` backs the tab-scoped tier and lives as long
//! as the process. `FileStore` backs the durable tier with a single JSON
//! object file.
//!
//! TRADE-OFFS
//! ==========
//! `FileStore` re-reads the file on every call instead of caching, so two
//! processes sharing a state directory see each other's writes the way two
//! browser tabs share `localStorage`. No cross-process lock is taken: the
//! last writer wins.

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;

use crate::error::StorageError;

/// Generic string-keyed container.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store; contents vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Durable store backed by one JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at `path`. The file is created lazily on first write;
    /// parent directories are created then as well.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }

    /// Current contents. A file that is not a JSON object of strings is
    /// logged and read as empty; the next write replaces it.
    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(StorageError::Io { path: self.path_string(), source }),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "durable store unreadable; treating as empty");
                Ok(BTreeMap::new())
            }
        }
    }

    /// Write through a uniquely named sibling temp file, then rename it over
    /// the store, so concurrent writers never share a partial file.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io { path: self.path_string(), source };
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_err)?;
        let body = serde_json::to_string_pretty(entries)?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(body.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn modify(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if apply(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.load()?;
        Ok(entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|entries| entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path: self.path_string(), source }),
        }
    }
}

// =============================================================================
// TIERED STORAGE
// =============================================================================

/// The two storage tiers handed to the session layer.
///
/// `*_item` methods address the durable tier (survives restarts);
/// `*_session` methods address the tab-scoped tier (cleared when the
/// process ends). Cloning shares the underlying stores.
#[derive(Clone)]
pub struct Storage {
    durable: Arc<dyn KeyValueStore>,
    tab: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>, tab: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, tab }
    }

    /// Both tiers in memory. Nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Durable tier at `path`, tab-scoped tier in memory.
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::open(path)), Arc::new(MemoryStore::new()))
    }

    /// # Errors
    ///
    /// Propagates failures from the durable medium.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.durable.set(key, value)
    }

    /// # Errors
    ///
    /// Propagates failures from the durable medium.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.durable.get(key)
    }

    /// # Errors
    ///
    /// Propagates failures from the durable medium.
    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.durable.remove(key)
    }

    /// # Errors
    ///
    /// Propagates failures from the durable medium.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.durable.clear()
    }

    /// # Errors
    ///
    /// Propagates failures from the tab-scoped medium.
    pub fn set_session(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.tab.set(key, value)
    }

    /// # Errors
    ///
    /// Propagates failures from the tab-scoped medium.
    pub fn get_session(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.tab.get(key)
    }

    /// # Errors
    ///
    /// Propagates failures from the tab-scoped medium.
    pub fn remove_session(&self, key: &str) -> Result<(), StorageError> {
        self.tab.remove(key)
    }

    /// # Errors
    ///
    /// Propagates failures from the tab-scoped medium.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.tab.clear()
    }
}
