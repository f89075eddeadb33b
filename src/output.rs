//! Rendering of command results.
//!
//! Text output prints one line per file; JSON output is meant for scripts.
//!
//! # Output Schema (`status --output json`)
//!
//! ```json
//! {
//!   "changed_files": ["/work/src/a.rs"],
//!   "not_found_files": [],
//!   "not_changed_files": ["/work/src/b.rs"]
//! }
//! ```

use crate::cache::{AnalyzedFiles, EntryMeta};
use crate::cli::OutputFormat;
use serde::Serialize;
use std::io::{self, Write};
use yansi::Paint;

#[derive(Debug, Serialize)]
struct JsonEntry<'a> {
    key: &'a str,
    #[serde(flatten)]
    meta: &'a EntryMeta,
}

/// Writes results to any [`Write`] sink.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
    color: bool,
}

impl Printer {
    #[must_use]
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Render the result of `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn status<W: Write>(&self, out: &mut W, analyzed: &AnalyzedFiles) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(out, analyzed),
            OutputFormat::Text => {
                for key in &analyzed.changed_files {
                    writeln!(out, "{} {}", self.label("changed  ", Label::Changed), key)?;
                }
                for key in &analyzed.not_found_files {
                    writeln!(out, "{} {}", self.label("missing  ", Label::Missing), key)?;
                }
                for key in &analyzed.not_changed_files {
                    writeln!(out, "{} {}", self.label("unchanged", Label::Unchanged), key)?;
                }
                Ok(())
            }
        }
    }

    /// Render the result of `changed`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn changed<W: Write>(&self, out: &mut W, keys: &[String]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(out, &keys),
            OutputFormat::Text => {
                for key in keys {
                    writeln!(out, "{key}")?;
                }
                Ok(())
            }
        }
    }

    /// Render the persisted entries for `inspect`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn entries<'a, W, I>(&self, out: &mut W, entries: I) -> io::Result<()>
    where
        W: Write,
        I: IntoIterator<Item = (&'a String, &'a EntryMeta)>,
    {
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<_> = entries
                    .into_iter()
                    .map(|(key, meta)| JsonEntry { key, meta })
                    .collect();
                write_json(out, &entries)
            }
            OutputFormat::Text => {
                for (key, meta) in entries {
                    let hash = meta.hash.as_deref().unwrap_or("-");
                    writeln!(
                        out,
                        "{key}\t{}\t{}\t{}",
                        meta.size,
                        meta.mtime,
                        self.label(hash, Label::Dim)
                    )?;
                }
                Ok(())
            }
        }
    }

    fn label(&self, text: &str, label: Label) -> String {
        if !self.color {
            return text.to_string();
        }
        match label {
            Label::Changed => text.yellow().to_string(),
            Label::Missing => text.red().to_string(),
            Label::Unchanged => text.green().to_string(),
            Label::Dim => text.dim().to_string(),
        }
    }
}

#[derive(Clone, Copy)]
enum Label {
    Changed,
    Missing,
    Unchanged,
    Dim,
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
