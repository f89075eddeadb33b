//! Per-instance staging area for descriptors computed during a run.

use crate::cache::entry::FileDescriptor;
use indexmap::IndexMap;

/// Descriptors observed since the cache instance was created.
///
/// Entries are kept in first-seen order; a later lookup of the same key
/// replaces the descriptor in place.
#[derive(Debug, Clone, Default)]
pub struct Session {
    entries: IndexMap<String, FileDescriptor>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `descriptor`, replacing any previous one for the same key.
    pub fn upsert(&mut self, descriptor: FileDescriptor) {
        self.entries.insert(descriptor.key.clone(), descriptor);
    }

    /// Drop the staged descriptor for `key`.
    pub fn evict(&mut self, key: &str) -> Option<FileDescriptor> {
        self.entries.shift_remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FileDescriptor> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FileDescriptor> {
        self.entries.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Staged descriptors in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
