//! The cache orchestrator.

use crate::cache::entry::{EntryMeta, FileDescriptor};
use crate::cache::session::Session;
use crate::fingerprint::{Fingerprint, FingerprintError, FingerprintMode, HashAlgorithm};
use crate::path_key;
use crate::store::{JsonStore, PersistentStore, StoreError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by [`FileEntryCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying store could not be read, written or removed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A staged file could not be re-examined for a reason other than
    /// having been deleted. Nothing was committed.
    #[error("Failed to reconcile {key}: {source}")]
    Reconcile {
        /// Key of the entry being reconciled
        key: String,
        /// The underlying fingerprint error
        #[source]
        source: FingerprintError,
    },

    /// The cache file path has no file name component.
    #[error("Invalid cache file path: {0}")]
    InvalidCachePath(PathBuf),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Construction options for a [`FileEntryCache`].
///
/// # Example
///
/// ```
/// use file_entry_cache::cache::CacheConfig;
/// use file_entry_cache::fingerprint::{FingerprintMode, HashAlgorithm};
///
/// let config = CacheConfig::default().with_checksum(true).with_root("/work");
/// assert_eq!(config.mode(), FingerprintMode::Checksum(HashAlgorithm::Blake3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Compare content digests instead of modification times.
    pub use_checksum: bool,
    /// Digest used when `use_checksum` is set.
    pub hash_algorithm: HashAlgorithm,
    /// Directory relative paths resolve against. Defaults to the process
    /// working directory at construction time.
    pub root: Option<PathBuf>,
    /// Drop entries whose files no longer exist when the cache is built.
    pub prune_missing: bool,
}

impl CacheConfig {
    #[must_use]
    pub fn with_checksum(mut self, use_checksum: bool) -> Self {
        self.use_checksum = use_checksum;
        self
    }

    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_prune_missing(mut self, prune_missing: bool) -> Self {
        self.prune_missing = prune_missing;
        self
    }

    /// Fingerprint mode selected by these options.
    #[must_use]
    pub fn mode(&self) -> FingerprintMode {
        FingerprintMode::from_flag(self.use_checksum, self.hash_algorithm)
    }
}

/// Classification of a batch of paths.
///
/// Every input key lands in exactly one list, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyzedFiles {
    pub changed_files: Vec<String>,
    pub not_found_files: Vec<String>,
    pub not_changed_files: Vec<String>,
}

enum Reconciled {
    Update(String, EntryMeta),
    Delete(String),
}

/// Remembers file fingerprints between runs and reports what changed.
///
/// Lookups stage their result in a [`Session`]; [`reconcile`](Self::reconcile)
/// commits the staged entries to the store and flushes it.
///
/// An instance is not synchronized. Two instances bound to the same store
/// overwrite each other: the last save wins.
///
/// # Example
///
/// ```no_run
/// use file_entry_cache::cache::{CacheConfig, FileEntryCache};
///
/// let mut cache = FileEntryCache::create(".lintcache", ".", CacheConfig::default()).unwrap();
/// for key in cache.get_updated_files(["src/main.rs", "src/lib.rs"]) {
///     println!("needs linting: {key}");
/// }
/// cache.reconcile().unwrap();
/// ```
#[derive(Debug)]
pub struct FileEntryCache<S: PersistentStore = JsonStore> {
    store: S,
    session: Session,
    mode: FingerprintMode,
    root: PathBuf,
}

impl FileEntryCache<JsonStore> {
    /// Load (or start) the store `id` inside `base_directory`.
    ///
    /// When no store exists yet every file is reported as changed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if an existing store file cannot be read.
    pub fn create(
        id: &str,
        base_directory: impl AsRef<Path>,
        config: CacheConfig,
    ) -> CacheResult<Self> {
        let store = JsonStore::load(id, base_directory.as_ref())?;
        Ok(Self::with_store(store, config))
    }

    /// Load the store whose file is `file_path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidCachePath`] if `file_path` has no file
    /// name, or [`CacheError::Store`] if the file cannot be read.
    pub fn create_from_file(file_path: impl AsRef<Path>, config: CacheConfig) -> CacheResult<Self> {
        let file_path = file_path.as_ref();
        let id = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CacheError::InvalidCachePath(file_path.to_path_buf()))?;
        let directory = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::create(id, directory, config)
    }
}

impl<S: PersistentStore> FileEntryCache<S> {
    /// Build a cache around an already loaded store.
    ///
    /// With `prune_missing` set, entries whose files are gone are removed from
    /// the in-memory store before any lookup.
    pub fn with_store(mut store: S, config: CacheConfig) -> Self {
        let mode = config.mode();
        if config.prune_missing {
            prune_missing(&mut store);
        }
        let root = config
            .root
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        log::debug!(
            "Cache at {} (mode: {:?}, root: {})",
            store.path().display(),
            mode,
            root.display()
        );

        Self {
            store,
            session: Session::new(),
            mode,
            root,
        }
    }

    /// Root used to resolve relative paths, as configured.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn mode(&self) -> FingerprintMode {
        self.mode
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Descriptors staged so far in this run.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Canonical key for `path` under this cache's root.
    #[must_use]
    pub fn key_for(&self, path: impl AsRef<Path>) -> String {
        path_key::normalize(path.as_ref(), &self.root)
    }

    /// Evaluate `path` against the store and stage the result.
    ///
    /// Never fails: a file that cannot be stat'd yields a descriptor with
    /// `not_found` and `changed` set, carrying the last known metadata.
    pub fn get_file_descriptor(&mut self, path: impl AsRef<Path>) -> FileDescriptor {
        let resolved = path_key::resolve(path.as_ref(), &self.root);
        let key = path_key::key_of(&resolved);
        let prior = self.store.get(&key);

        // Stat the resolved path; the key may be a different spelling of it.
        let descriptor = match Fingerprint::compute(&resolved, self.mode) {
            Ok(fingerprint) => {
                let changed = prior.map_or(true, |p| fingerprint.differs_from(p, self.mode));
                FileDescriptor {
                    meta: EntryMeta::from_fingerprint(&fingerprint, prior),
                    key,
                    path: resolved,
                    changed,
                    not_found: false,
                }
            }
            Err(e) => {
                log::trace!("Treating as not found: {}", e);
                FileDescriptor::missing(key, resolved, prior)
            }
        };

        log::trace!(
            "{} changed={} not_found={}",
            descriptor.key,
            descriptor.changed,
            descriptor.not_found
        );
        self.session.upsert(descriptor.clone());
        descriptor
    }

    /// Whether `path` changed since it was last reconciled.
    pub fn has_file_changed(&mut self, path: impl AsRef<Path>) -> bool {
        self.get_file_descriptor(path).changed
    }

    /// Descriptors for every path, in input order.
    ///
    /// An empty iterator yields an empty result. Callers holding an optional
    /// list can pass `list.into_iter().flatten()`.
    pub fn normalize_entries<I>(&mut self, paths: I) -> Vec<FileDescriptor>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|path| self.get_file_descriptor(path))
            .collect()
    }

    /// Keys of the paths that changed, in input order.
    pub fn get_updated_files<I>(&mut self, paths: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        self.normalize_entries(paths)
            .into_iter()
            .filter(|entry| entry.changed)
            .map(|entry| entry.key)
            .collect()
    }

    /// Split paths into changed, not found and unchanged keys.
    pub fn analyze_files<I>(&mut self, paths: I) -> AnalyzedFiles
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut analyzed = AnalyzedFiles::default();
        for entry in self.normalize_entries(paths) {
            if entry.not_found {
                analyzed.not_found_files.push(entry.key);
            } else if entry.changed {
                analyzed.changed_files.push(entry.key);
            } else {
                analyzed.not_changed_files.push(entry.key);
            }
        }
        analyzed
    }

    /// The staged descriptor for `path`, for attaching `meta.data` before
    /// [`reconcile`](Self::reconcile).
    pub fn descriptor_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut FileDescriptor> {
        let key = self.key_for(path);
        self.session.get_mut(&key)
    }

    /// Attach `data` to the staged descriptor for `path`.
    ///
    /// Returns `false` if `path` was not looked up in this run.
    pub fn set_entry_data(&mut self, path: impl AsRef<Path>, data: serde_json::Value) -> bool {
        match self.descriptor_mut(path) {
            Some(descriptor) => {
                descriptor.meta.data = Some(data);
                true
            }
            None => false,
        }
    }

    /// Forget `path` so it is reported as changed on the next lookup.
    ///
    /// The entry is deleted from the store and the store is flushed right
    /// away, independent of [`reconcile`](Self::reconcile). Nothing is
    /// written when the store held no entry for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the flush fails.
    pub fn remove_entry(&mut self, path: impl AsRef<Path>) -> CacheResult<()> {
        let key = self.key_for(path);
        self.session.evict(&key);
        if self.store.remove(&key).is_some() {
            self.store.save()?;
            log::debug!("Removed entry {}", key);
        }
        Ok(())
    }

    /// Commit every staged entry to the store and flush it.
    ///
    /// Files that still exist get their current fingerprint recorded, keeping
    /// any `data` attached to them. Files that are gone are deleted from the
    /// store. Entries never looked up in this run are left alone. With nothing
    /// staged this is a no-op and nothing is written.
    ///
    /// # Errors
    ///
    /// [`CacheError::Reconcile`] if a staged file cannot be examined for a
    /// reason other than being missing; the store is left untouched.
    /// [`CacheError::Store`] if the flush fails.
    pub fn reconcile(&mut self) -> CacheResult<()> {
        if self.session.is_empty() {
            log::trace!("Nothing staged, skipping reconcile");
            return Ok(());
        }

        let mut pending = Vec::with_capacity(self.session.len());
        for descriptor in self.session.iter() {
            match Fingerprint::compute(&descriptor.path, self.mode) {
                Ok(fingerprint) => {
                    let mut meta = descriptor.meta.clone();
                    meta.apply(&fingerprint);
                    pending.push(Reconciled::Update(descriptor.key.clone(), meta));
                }
                Err(FingerprintError::NotFound(_)) => {
                    pending.push(Reconciled::Delete(descriptor.key.clone()));
                }
                Err(source) => {
                    return Err(CacheError::Reconcile {
                        key: descriptor.key.clone(),
                        source,
                    });
                }
            }
        }

        let (mut updated, mut deleted) = (0usize, 0usize);
        for change in pending {
            match change {
                Reconciled::Update(key, meta) => {
                    self.store.set(&key, meta);
                    updated += 1;
                }
                Reconciled::Delete(key) => {
                    if self.store.remove(&key).is_some() {
                        deleted += 1;
                    }
                }
            }
        }

        self.store.save()?;
        log::debug!(
            "Reconciled {} entries ({} deleted) into {}",
            updated,
            deleted,
            self.store.path().display()
        );
        Ok(())
    }

    /// Clear the session and remove the store from memory and disk.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the store file cannot be removed.
    pub fn destroy(&mut self) -> CacheResult<()> {
        self.session.clear();
        self.store.destroy()?;
        Ok(())
    }

    /// Remove the store file from disk, keeping everything in memory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the file exists but cannot be removed.
    pub fn delete_cache_file(&mut self) -> CacheResult<()> {
        self.store.delete_file()?;
        Ok(())
    }
}

fn prune_missing<S: PersistentStore>(store: &mut S) {
    let mut pruned = 0usize;
    for key in store.keys() {
        // Keys from names that were not valid UTF-8 cannot be stat'd back.
        let Some(candidates) = path_key::spellings(&key) else {
            continue;
        };
        let gone = candidates.iter().all(|path| {
            matches!(std::fs::metadata(path), Err(e) if e.kind() == std::io::ErrorKind::NotFound)
        });
        if gone {
            store.remove(&key);
            pruned += 1;
        }
    }
    if pruned > 0 {
        log::debug!("Pruned {} entries for missing files", pruned);
    }
}
