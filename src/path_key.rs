//! Cache key normalization for file paths.
//!
//! Every path handed to the cache is turned into a canonical string before it
//! is used as a key. The same file must map to the same entry whether it was
//! referenced absolutely, relatively, or with a different Unicode spelling.
//!
//! # Background
//!
//! macOS uses NFD (Decomposed) normalization for file paths, while Windows
//! and Linux typically use NFC (Composed) normalization. This means the same
//! visual filename can have different byte representations:
//!
//! - NFC: `café.txt` - 'é' is U+00E9 (single code point)
//! - NFD: `café.txt` - 'e' U+0065 + combining acute accent U+0301
//!
//! Keys are always NFC.
//!
//! # Example
//!
//! ```
//! use file_entry_cache::path_key::normalize;
//! use std::path::Path;
//!
//! let root = Path::new("/work/project");
//! assert_eq!(
//!     normalize(Path::new("src/main.rs"), root),
//!     normalize(Path::new("/work/project/src/./main.rs"), root),
//! );
//! ```

use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize `path` into the canonical cache key.
///
/// Absolute paths are used as-is after removing `.` and `..` components.
/// Relative paths are resolved against `root`. The file does not need to
/// exist and symlinks are not followed.
///
/// # Arguments
///
/// * `path` - The path as the caller referenced it
/// * `root` - Directory used to resolve relative paths
#[must_use]
pub fn normalize(path: &Path, root: &Path) -> String {
    key_of(&resolve(path, root))
}

/// Key for a path already produced by [`resolve`].
#[must_use]
pub fn key_of(resolved: &Path) -> String {
    normalize_path_str(&resolved.to_string_lossy())
}

/// On-disk spellings a stored key may have come from.
///
/// Returns `None` when the key holds U+FFFD, i.e. the original name was not
/// valid UTF-8 and cannot be recovered. Otherwise the key itself comes first,
/// followed by its NFD form when that differs.
#[must_use]
pub fn spellings(key: &str) -> Option<Vec<PathBuf>> {
    if key.contains(char::REPLACEMENT_CHARACTER) {
        return None;
    }
    let mut paths = vec![PathBuf::from(key)];
    let nfd: String = key.nfd().collect();
    if nfd != key {
        paths.push(PathBuf::from(nfd));
    }
    Some(paths)
}

/// Resolve `path` against `root` without consulting the filesystem.
///
/// A relative `root` is itself resolved against the process working directory.
#[must_use]
pub fn resolve(path: &Path, root: &Path) -> PathBuf {
    let root = absolute_root(root);
    match path.absolutize_from(&root) {
        Ok(resolved) => resolved.into_owned(),
        Err(e) => {
            log::trace!("Falling back to join for {}: {}", path.display(), e);
            root.join(path)
        }
    }
}

fn absolute_root(root: &Path) -> PathBuf {
    if root.is_absolute() {
        return root.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(root),
        Err(e) => {
            log::debug!("Cannot read current directory, using root verbatim: {}", e);
            root.to_path_buf()
        }
    }
}

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}
