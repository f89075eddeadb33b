//! Durable key/metadata storage behind the cache.
//!
//! The cache only talks to the [`PersistentStore`] trait. [`JsonStore`] is the
//! default implementation: one JSON object per store id, written atomically.
//!
//! # File format
//!
//! ```json
//! {
//!   "/abs/path/a.txt": { "size": 14, "mtime": 1700000000000 },
//!   "/abs/path/b.txt": { "size": 9, "mtime": 1700000000000, "hash": "af13...", "data": { "foo": "bar" } }
//! }
//! ```

use crate::cache::entry::EntryMeta;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or removing the store file failed.
    #[error("Store I/O error for {path}: {source}")]
    Io {
        /// Path of the store artifact
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The in-memory record could not be serialized.
    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable mapping from path key to [`EntryMeta`].
pub trait PersistentStore {
    /// Metadata last recorded for `key`.
    fn get(&self, key: &str) -> Option<&EntryMeta>;

    /// Record `meta` for `key` in memory.
    fn set(&mut self, key: &str, meta: EntryMeta);

    /// Forget `key` in memory.
    fn remove(&mut self, key: &str) -> Option<EntryMeta>;

    /// All keys currently held.
    fn keys(&self) -> Vec<String>;

    /// Flush the in-memory record to durable storage.
    fn save(&mut self) -> StoreResult<()>;

    /// Clear memory and remove the durable artifact.
    fn destroy(&mut self) -> StoreResult<()>;

    /// Remove the durable artifact only; memory is kept.
    fn delete_file(&mut self) -> StoreResult<()>;

    /// Location of the durable artifact.
    fn path(&self) -> &Path;
}

/// JSON file store located at `directory/id`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    entries: BTreeMap<String, EntryMeta>,
}

impl JsonStore {
    /// Load the store for `id` inside `directory`.
    ///
    /// A missing file yields an empty store. A file that cannot be parsed is
    /// logged and treated as empty; it is replaced on the next save.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn load(id: &str, directory: &Path) -> StoreResult<Self> {
        let path = directory.join(id);
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => parse_entries(&path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No store at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        log::debug!("Loaded {} entries from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    /// Number of entries held in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &EntryMeta)> {
        self.entries.iter()
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn parse_entries(path: &Path, content: &str) -> BTreeMap<String, EntryMeta> {
    if content.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str(content) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!(
                "Ignoring unreadable store {} ({}); it will be rewritten on save",
                path.display(),
                e
            );
            BTreeMap::new()
        }
    }
}

impl PersistentStore for JsonStore {
    fn get(&self, key: &str) -> Option<&EntryMeta> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, meta: EntryMeta) {
        self.entries.insert(key.to_string(), meta);
    }

    fn remove(&mut self, key: &str) -> Option<EntryMeta> {
        self.entries.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn save(&mut self) -> StoreResult<()> {
        let json = serde_json::to_string(&self.entries)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        // Write next to the target so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        log::debug!(
            "Saved {} entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn destroy(&mut self) -> StoreResult<()> {
        self.entries.clear();
        self.delete_file()
    }

    fn delete_file(&mut self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("Removed store file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
