//! Layered configuration for the binary.
//!
//! Sources, later ones win:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `FILE_ENTRY_CACHE_`
//! 4. CLI flags (applied by [`Config::apply_cli`])
//!
//! ```toml
//! cache_dir = ".cache"
//! store_id = ".lintcache"
//! checksum = true
//! hash_algorithm = "sha256"
//! root = "/work/project"
//! prune_missing = true
//! ```

use crate::cache::CacheConfig;
use crate::cli::CacheArgs;
use crate::fingerprint::HashAlgorithm;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "FILE_ENTRY_CACHE_";

/// Default store id when none is configured.
pub const DEFAULT_STORE_ID: &str = ".file-entry-cache";

const KNOWN_KEYS: &[&str] = &[
    "cache_dir",
    "store_id",
    "checksum",
    "hash_algorithm",
    "root",
    "prune_missing",
];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// The config file could not be read or is not valid TOML.
    #[error("Failed to read config file {path}: {message}")]
    Unreadable {
        /// Path of the config file
        path: PathBuf,
        /// Reason reported by the reader or parser
        message: String,
    },

    /// A key in the config file is not recognized.
    #[error("Unknown config key `{key}`{}", suggestion_suffix(.suggestion))]
    UnknownKey {
        /// The unrecognized key
        key: String,
        /// Closest known key, if any is close enough
        suggestion: Option<String>,
    },

    /// A value could not be extracted into [`Config`].
    #[error("Invalid configuration: {0}")]
    Extract(#[from] figment::Error),

    /// The store id is empty or contains a path separator.
    #[error("Invalid store id `{0}`: must be a non-empty file name")]
    InvalidStoreId(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean `{s}`?)"),
        None => String::new(),
    }
}

/// Binary configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store file.
    pub cache_dir: PathBuf,
    /// Store file name inside `cache_dir`.
    pub store_id: String,
    /// Compare content digests instead of modification times.
    pub checksum: bool,
    /// Digest used in checksum mode.
    pub hash_algorithm: HashAlgorithm,
    /// Directory relative paths resolve against (defaults to the working directory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Drop entries for files that no longer exist when the store is opened.
    pub prune_missing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("."),
            store_id: DEFAULT_STORE_ID.to_string(),
            checksum: false,
            hash_algorithm: HashAlgorithm::default(),
            root: None,
            prune_missing: false,
        }
    }
}

impl Config {
    /// Load from `explicit`, or from the platform config file if present.
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing, a file cannot be parsed, contains
    /// unknown keys, or the merged values do not validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from(Some(path)),
            None => {
                let default_path = Self::default_path().filter(|p| p.exists());
                Self::load_from(default_path.as_deref())
            }
        }
    }

    /// Load defaults, then `file` (if any), then the environment.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            check_keys(path)?;
        }
        let config: Config = Self::figment(file).extract()?;
        config.validate()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The figment used by [`Config::load_from`].
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "file-entry-cache").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject values the cache cannot work with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidStoreId`] for empty ids or ids with separators.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let id = self.store_id.as_str();
        if id.is_empty() || id == "." || id == ".." || id.contains(|c: char| c == '/' || c == '\\') {
            return Err(ConfigError::InvalidStoreId(self.store_id.clone()));
        }
        Ok(())
    }

    /// Apply CLI flags on top of the loaded values.
    pub fn apply_cli(&mut self, args: &CacheArgs) {
        if let Some(dir) = &args.cache_dir {
            self.cache_dir = dir.clone();
        }
        if let Some(id) = &args.store_id {
            self.store_id = id.clone();
        }
        if let Some(file) = &args.cache_file {
            if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
                self.store_id = name.to_string();
            }
            self.cache_dir = match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
        }
        if args.checksum {
            self.checksum = true;
        }
        if let Some(algorithm) = args.hash_algorithm {
            self.hash_algorithm = algorithm;
        }
        if let Some(root) = &args.root {
            self.root = Some(root.clone());
        }
        if args.prune_missing {
            self.prune_missing = true;
        }
    }

    /// Location of the store file.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.cache_dir.join(&self.store_id)
    }

    /// Options for [`crate::cache::FileEntryCache::create`].
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::default()
            .with_checksum(self.checksum)
            .with_hash_algorithm(self.hash_algorithm)
            .with_prune_missing(self.prune_missing);
        match &self.root {
            Some(root) => config.with_root(root.clone()),
            None => config,
        }
    }
}

fn check_keys(path: &Path) -> Result<(), ConfigError> {
    let unreadable = |message: String| ConfigError::Unreadable {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| unreadable(e.to_string()))?;

    for key in table.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            return Err(ConfigError::UnknownKey {
                key: key.clone(),
                suggestion: closest_key(key),
            });
        }
    }
    Ok(())
}

fn closest_key(key: &str) -> Option<String> {
    KNOWN_KEYS
        .iter()
        .map(|known| (known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| (*known).to_string())
}
