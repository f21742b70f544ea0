//! Error types for the embedding search system
//!
//! Every error renders as `"<STATUS_CODE>: <message>"` so callers on other
//! platforms can keep matching on the same strings. Use [`SearchError::kind`]
//! for programmatic handling instead of parsing the text.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad options or arguments, detected eagerly.
    Configuration,
    /// Missing, unreadable, truncated or otherwise malformed index.
    InvalidIndex,
    /// Query or provider vector size does not match the index.
    DimensionMismatch,
    /// Failure reported by the embedding provider.
    Embedding,
    /// Engine-internal failure, including cancellation.
    Search,
}

/// Main error type for searcher construction and search calls
#[derive(Error, Debug)]
pub enum SearchError {
    /// Invalid options or call arguments
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    /// The index source could not be opened or read
    #[error("{code}: Unable to open index file '{path}': {source}", code = io_status_code(.source))]
    IndexUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The index bytes are not a valid index
    #[error("INVALID_ARGUMENT: Invalid index: {reason}")]
    InvalidIndex { reason: String },

    #[error("INVALID_ARGUMENT: Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Opaque failure from the embedding provider, passed through unchanged
    #[error("INTERNAL: Embedding failed: {0}")]
    Embedding(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("CANCELLED: Search cancelled after scanning {scanned} of {total} records")]
    Cancelled { scanned: usize, total: usize },

    #[error("INTERNAL: {0}")]
    Internal(String),
}

fn io_status_code(error: &std::io::Error) -> &'static str {
    match error.kind() {
        std::io::ErrorKind::NotFound => "NOT_FOUND",
        std::io::ErrorKind::PermissionDenied => "PERMISSION_DENIED",
        _ => "INTERNAL",
    }
}

impl SearchError {
    /// Build an `InvalidArgument` error from any message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Build an `InvalidIndex` error from any reason.
    pub fn invalid_index(reason: impl Into<String>) -> Self {
        Self::InvalidIndex {
            reason: reason.into(),
        }
    }

    /// Wrap a provider failure.
    pub fn embedding(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Embedding(error.into())
    }

    /// Which branch of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::Configuration,
            Self::IndexUnreadable { .. } | Self::InvalidIndex { .. } => ErrorKind::InvalidIndex,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::Embedding(_) => ErrorKind::Embedding,
            Self::Cancelled { .. } | Self::Internal(_) => ErrorKind::Search,
        }
    }

    /// Get a stable status code for this error.
    ///
    /// This is the prefix of the rendered message.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_)
            | Self::InvalidIndex { .. }
            | Self::DimensionMismatch { .. } => "INVALID_ARGUMENT",
            Self::IndexUnreadable { source, .. } => io_status_code(source),
            Self::Embedding(_) | Self::Internal(_) => "INTERNAL",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidArgument(_) => vec![
                "Check the searcher options against 'embedsearch config'",
                "max_results must be greater than zero",
            ],
            Self::IndexUnreadable { .. } => vec![
                "Check that the index file exists and you have read permissions",
                "Pass the index content directly if the file lives in an archive",
            ],
            Self::InvalidIndex { .. } => vec![
                "The index file may be corrupted or truncated, rebuild it",
                "Make sure the index was written by a compatible format version",
            ],
            Self::DimensionMismatch { .. } => vec![
                "Ensure the index was built with the same embedding model",
            ],
            Self::Embedding(_) => vec!["Verify the embedding model is properly initialized"],
            Self::Cancelled { .. } => vec!["Retry the search without a cancellation deadline"],
            Self::Internal(_) => vec![],
        }
    }
}
