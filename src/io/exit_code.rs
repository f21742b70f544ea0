//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed with results
//! - `1`: General error - unspecified failure
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::SearchError;

/// Standard exit codes for CLI operations.
///
/// These codes follow Unix conventions where 0 indicates success,
/// and non-zero values indicate various error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Missing file, or a search that matched nothing (code 3)
    NotFound = 3,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Index corruption detected (code 7)
    IndexCorrupted = 7,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Convert a `SearchError` to the appropriate exit code.
    ///
    /// Maps specific error types to semantic exit codes that scripts
    /// can use to determine appropriate recovery actions.
    pub fn from_error(error: &SearchError) -> Self {
        match error {
            SearchError::IndexUnreadable { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ExitCode::NotFound
            }
            SearchError::IndexUnreadable { .. } => ExitCode::IoError,
            SearchError::InvalidIndex { .. } => ExitCode::IndexCorrupted,
            SearchError::InvalidArgument(_) | SearchError::DimensionMismatch { .. } => {
                ExitCode::ConfigError
            }

            // Everything else is a general error
            SearchError::Embedding(_)
            | SearchError::Cancelled { .. }
            | SearchError::Internal(_) => ExitCode::GeneralError,
        }
    }
}
