//! Cache entry definitions.

use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Metadata persisted for a single file.
///
/// Fields this crate does not know about are kept in `extra` so that records
/// written by other tools survive a load/reconcile/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub mtime: i64,
    /// Hex content digest (checksum mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Opaque caller payload. An explicit `null` loads back as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntryMeta {
    /// Metadata for `fingerprint`, carrying `data` and unknown fields over from `prior`.
    #[must_use]
    pub fn from_fingerprint(fingerprint: &Fingerprint, prior: Option<&EntryMeta>) -> Self {
        let mut meta = prior.cloned().unwrap_or_default();
        meta.apply(fingerprint);
        meta
    }

    /// Overwrite the fingerprint fields, leaving `data` and `extra` alone.
    pub fn apply(&mut self, fingerprint: &Fingerprint) {
        self.size = fingerprint.size;
        self.mtime = fingerprint.mtime;
        self.hash = fingerprint.hash.clone();
    }
}

// A present field is always `Some`, even when it holds `null`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Result of evaluating one path in the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDescriptor {
    /// Canonical path key.
    pub key: String,
    /// Resolved on-disk path the fingerprint was taken from. It can differ
    /// from `key` in Unicode form or in bytes that are not valid UTF-8.
    #[serde(skip)]
    pub path: PathBuf,
    /// Current fingerprint, or the last known one when the file is gone.
    pub meta: EntryMeta,
    /// True when there was no prior fingerprint or it differs.
    pub changed: bool,
    /// True when the file could not be stat'd. Implies `changed`.
    #[serde(rename = "notFound")]
    pub not_found: bool,
}

impl FileDescriptor {
    /// Descriptor for a file that could not be stat'd.
    #[must_use]
    pub fn missing(key: String, path: PathBuf, last_known: Option<&EntryMeta>) -> Self {
        Self {
            key,
            path,
            meta: last_known.cloned().unwrap_or_default(),
            changed: true,
            not_found: true,
        }
    }
}
