//! Subcommand implementations.

use crate::cache::FileEntryCache;
use crate::cli::{CheckArgs, ForgetArgs, InspectArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::Printer;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn open(config: &Config) -> Result<FileEntryCache> {
    FileEntryCache::create(&config.store_id, &config.cache_dir, config.cache_config())
        .with_context(|| format!("Failed to open cache {}", config.store_path().display()))
}

/// `status`: classify the given files.
///
/// # Errors
///
/// Fails if the store cannot be opened, reconciled or output cannot be written.
pub fn status<W: Write>(config: &Config, args: &CheckArgs, color: bool, out: &mut W) -> Result<ExitCode> {
    let mut cache = open(config)?;
    let files = expand_paths(&args.paths, &config.store_path());
    let analyzed = cache.analyze_files(&files);

    if args.reconcile {
        cache.reconcile().context("Failed to reconcile cache")?;
    }
    Printer::new(args.output, color).status(out, &analyzed)?;

    log::info!(
        "{} changed, {} missing, {} unchanged",
        analyzed.changed_files.len(),
        analyzed.not_found_files.len(),
        analyzed.not_changed_files.len()
    );
    if analyzed.changed_files.is_empty() && analyzed.not_found_files.is_empty() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::ChangesDetected)
    }
}

/// `changed`: list the files that changed.
///
/// # Errors
///
/// Fails if the store cannot be opened, reconciled or output cannot be written.
pub fn changed<W: Write>(config: &Config, args: &CheckArgs, color: bool, out: &mut W) -> Result<ExitCode> {
    let mut cache = open(config)?;
    let files = expand_paths(&args.paths, &config.store_path());
    let updated = cache.get_updated_files(&files);

    if args.reconcile {
        cache.reconcile().context("Failed to reconcile cache")?;
    }
    Printer::new(args.output, color).changed(out, &updated)?;

    if updated.is_empty() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::ChangesDetected)
    }
}

/// `forget`: remove entries from the store.
///
/// # Errors
///
/// Fails if the store cannot be opened or saved.
pub fn forget(config: &Config, args: &ForgetArgs) -> Result<ExitCode> {
    let mut cache = open(config)?;
    for path in &args.paths {
        cache
            .remove_entry(path)
            .with_context(|| format!("Failed to forget {}", path.display()))?;
    }
    Ok(ExitCode::Success)
}

/// `clear`: delete the store.
///
/// # Errors
///
/// Fails if the store file cannot be removed.
pub fn clear(config: &Config) -> Result<ExitCode> {
    let mut cache = open(config)?;
    cache.destroy().context("Failed to delete cache")?;
    Ok(ExitCode::Success)
}

/// `inspect`: print the persisted entries.
///
/// # Errors
///
/// Fails if the store cannot be opened or output cannot be written.
pub fn inspect<W: Write>(config: &Config, args: &InspectArgs, color: bool, out: &mut W) -> Result<ExitCode> {
    let cache = open(config)?;
    Printer::new(args.output, color).entries(out, cache.store().iter())?;
    Ok(ExitCode::Success)
}

/// Expand directories into the files beneath them, in sorted order.
///
/// Plain paths pass through untouched, whether or not they exist. The store
/// file itself is never reported.
#[must_use]
pub fn expand_paths(paths: &[PathBuf], store_path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if !same_file(entry.path(), store_path) {
                        files.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable entry: {}", e),
            }
        }
    }
    files
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
