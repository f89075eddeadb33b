//! File entry cache: change detection between runs.
//!
//! This module remembers which files a tool has already processed and reports
//! which of them changed since the last time results were committed.
//!
//! # Architecture
//!
//! * [`file_cache`]: The [`FileEntryCache`] orchestrator and its error types.
//! * [`entry`]: The persisted [`EntryMeta`] and the per-lookup [`FileDescriptor`].
//! * [`session`]: Descriptors staged during the current run.
//!
//! # Change Detection
//!
//! A file is reported as changed when:
//! * It has never been committed to the store
//! * Its size differs from the recorded size
//! * Its modification time differs (default mode), or its content digest
//!   differs (checksum mode)
//! * It can no longer be stat'd
//!
//! Nothing is written until [`FileEntryCache::reconcile`] is called.

pub mod entry;
pub mod file_cache;
pub mod session;

pub use entry::{EntryMeta, FileDescriptor};
pub use file_cache::{AnalyzedFiles, CacheConfig, CacheError, CacheResult, FileEntryCache};
pub use session::Session;
