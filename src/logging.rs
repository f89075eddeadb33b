//! Logging setup for the binary.
//!
//! The library logs through the `log` facade; the binary installs
//! `env_logger`. Level selection, highest priority first:
//!
//! 1. `RUST_LOG` environment variable
//! 2. `--quiet` (errors only)
//! 3. `-v` (debug) / `-vv` (trace)
//! 4. Default: info
//!
//! ```rust,no_run
//! use file_entry_cache::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Install the global logger.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }

    let with_target = verbose >= 2;
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if with_target {
            writeln!(
                buf,
                "{style}{level:<5}{style:#} [{}] {}",
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        }
    });

    if builder.try_init().is_ok() {
        log::debug!("Logging initialized at {:?}", log::max_level());
    }
}

/// Map CLI flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
