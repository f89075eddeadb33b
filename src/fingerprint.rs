//! File fingerprints for change detection.
//!
//! A fingerprint is the comparable snapshot of a file: its size plus either
//! its modification time or a digest of its content. Which of the two is
//! used is fixed per cache instance by [`FingerprintMode`].

use crate::cache::entry::EntryMeta;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Content digest used in checksum mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Hex digest of `bytes`.
    #[must_use]
    pub fn digest(self, bytes: &[u8]) -> String {
        match self {
            Self::Blake3 => blake3::hash(bytes).to_hex().to_string(),
            Self::Sha256 => format!("{:x}", Sha256::digest(bytes)),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Blake3 => write!(f, "blake3"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// How fingerprints are computed and compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FingerprintMode {
    /// Size and modification time.
    #[default]
    MtimeSize,
    /// Size and content digest; mtime is recorded but never compared.
    Checksum(HashAlgorithm),
}

impl FingerprintMode {
    /// Build the mode from the `use_checksum` flag.
    #[must_use]
    pub fn from_flag(use_checksum: bool, algorithm: HashAlgorithm) -> Self {
        if use_checksum {
            Self::Checksum(algorithm)
        } else {
            Self::MtimeSize
        }
    }

    /// Whether content hashing is enabled.
    #[must_use]
    pub fn uses_checksum(self) -> bool {
        matches!(self, Self::Checksum(_))
    }
}

/// Errors raised while fingerprinting a file.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The file does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Any other failure to stat or read the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl FingerprintError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Current state of a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// File size in bytes
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch
    pub mtime: i64,
    /// Hex content digest, only present in checksum mode
    pub hash: Option<String>,
}

impl Fingerprint {
    /// Stat (and in checksum mode, hash) the file at `path`.
    ///
    /// # Errors
    ///
    /// [`FingerprintError::NotFound`] when the file is missing,
    /// [`FingerprintError::Io`] for every other failure.
    pub fn compute(path: &Path, mode: FingerprintMode) -> Result<Self, FingerprintError> {
        let metadata = std::fs::metadata(path).map_err(|e| FingerprintError::from_io(path, e))?;
        let mtime = metadata
            .modified()
            .map(system_time_to_millis)
            .map_err(|e| FingerprintError::from_io(path, e))?;

        let hash = match mode {
            FingerprintMode::MtimeSize => None,
            FingerprintMode::Checksum(algorithm) => {
                let bytes = std::fs::read(path).map_err(|e| FingerprintError::from_io(path, e))?;
                Some(algorithm.digest(&bytes))
            }
        };

        Ok(Self {
            size: metadata.len(),
            mtime,
            hash,
        })
    }

    /// Whether this fingerprint differs from a previously recorded one.
    ///
    /// Size is always compared first; then mtime, or the hash in checksum mode.
    #[must_use]
    pub fn differs_from(&self, prior: &EntryMeta, mode: FingerprintMode) -> bool {
        if self.size != prior.size {
            return true;
        }
        match mode {
            FingerprintMode::MtimeSize => self.mtime != prior.mtime,
            FingerprintMode::Checksum(_) => self.hash != prior.hash,
        }
    }
}

/// Convert a [`SystemTime`] to epoch milliseconds, negative before 1970.
#[must_use]
pub fn system_time_to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}
