//! Exit codes and structured error reporting for the binary.

use serde::Serialize;

/// Exit codes for the `file-entry-cache` binary.
///
/// - 0: Success (nothing changed, or a maintenance command completed)
/// - 1: General error
/// - 2: Changes detected (some files changed or disappeared)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed; no changed or missing files.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Completed; at least one file changed or is missing.
    ChangesDetected = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FEC000",
            Self::GeneralError => "FEC001",
            Self::ChangesDetected => "FEC002",
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "FEC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
