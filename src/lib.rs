//! file-entry-cache - persistent file change detection
//!
//! Remembers, between runs, which files a tool has already processed and
//! reports which of them changed since. Fingerprints are size + modification
//! time, or size + content digest in checksum mode.
//!
//! ```no_run
//! use file_entry_cache::cache::{CacheConfig, FileEntryCache};
//!
//! let mut cache = FileEntryCache::create_from_file(".lintcache", CacheConfig::default())?;
//! let analyzed = cache.analyze_files(["src/main.rs", "src/lib.rs"]);
//! for key in &analyzed.changed_files {
//!     println!("lint {key}");
//! }
//! cache.reconcile()?;
//! # Ok::<(), file_entry_cache::cache::CacheError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod output;
pub mod path_key;
pub mod store;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::Config;
use error::ExitCode;

/// Run the binary's logic for parsed arguments.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or a command fails.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli.cache);
    config
        .validate()
        .context("Invalid cache options on the command line")?;

    let color = !cli.no_color && yansi::is_enabled();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Status(args) => commands::status(&config, &args, color, &mut stdout),
        Commands::Changed(args) => commands::changed(&config, &args, color, &mut stdout),
        Commands::Forget(args) => commands::forget(&config, &args),
        Commands::Clear => commands::clear(&config),
        Commands::Inspect(args) => commands::inspect(&config, &args, color, &mut stdout),
    }
}
