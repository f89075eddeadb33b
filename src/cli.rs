//! Command-line interface definitions.
//!
//! Global options select the store and the fingerprint mode; subcommands
//! query or maintain it.
//!
//! # Example
//!
//! ```bash
//! # Which of these files changed since the last reconcile?
//! file-entry-cache --cache-file .lintcache changed src/ --reconcile
//!
//! # Classify files, compare by content instead of mtime
//! file-entry-cache --checksum status src/main.rs src/lib.rs --output json
//!
//! # Force a file to be reported as changed next time
//! file-entry-cache forget src/main.rs
//! ```

use crate::fingerprint::HashAlgorithm;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Remember which files were processed and report which changed since.
#[derive(Debug, Parser)]
#[command(name = "file-entry-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub cache: CacheArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting the store and how fingerprints are computed.
#[derive(Debug, Clone, Default, Args)]
pub struct CacheArgs {
    /// Store file path (overrides --cache-dir and --store-id)
    #[arg(long, global = true, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Directory holding the store file
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Store file name inside the cache directory
    #[arg(long, global = true, value_name = "ID")]
    pub store_id: Option<String>,

    /// Compare file content instead of modification time
    #[arg(long, global = true)]
    pub checksum: bool,

    /// Digest used with --checksum
    #[arg(long, global = true, value_enum, value_name = "ALGORITHM")]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// Directory relative paths resolve against (default: working directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Drop entries for files that no longer exist when opening the store
    #[arg(long, global = true)]
    pub prune_missing: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify files as changed, missing or unchanged
    Status(CheckArgs),
    /// List files that changed since the last reconcile
    Changed(CheckArgs),
    /// Drop files from the store so they are reported as changed next time
    Forget(ForgetArgs),
    /// Delete the store
    Clear,
    /// Print the persisted entries
    Inspect(InspectArgs),
}

/// Arguments for `status` and `changed`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Files or directories (directories are walked recursively)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Commit the current state of the checked files to the store
    #[arg(long)]
    pub reconcile: bool,
}

/// Arguments for `forget`.
#[derive(Debug, Args)]
pub struct ForgetArgs {
    /// Files to forget
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for `inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per file
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
