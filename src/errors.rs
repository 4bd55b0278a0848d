//! Custom error types for the scanview dashboard.
//!
//! Recoverable aggregation errors (`CatalogMiss`, `UnknownSeverity`) are
//! produced by lookups and consumed locally. Everything else propagates.

use crate::catalog::Language;
use std::path::PathBuf;

/// The main error type for scanview operations.
#[derive(Debug, thiserror::Error)]
pub enum ScanviewError {
    /// I/O error (file read/write, permissions, etc.)
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A result references an entry the active catalog does not have
    #[error("No catalog entry for issue {issue_id} / result {result_id}")]
    CatalogMiss { issue_id: u32, result_id: u32 },

    /// Severity code outside 0..=4
    #[error("Unknown severity code: {0}")]
    UnknownSeverity(i64),

    /// Chart window requested with a size below 1
    #[error("Invalid window size: {0} (must be at least 1)")]
    InvalidWindowSize(usize),

    /// The scanning backend rejected or could not be reached
    #[error("Scanning backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Language index outside 0..=6
    #[error("Unknown language index: {0}")]
    UnknownLanguage(i64),

    /// No catalog could be loaded for the requested language
    #[error("No issue catalog available for {0}")]
    CatalogUnavailable(Language),

    /// A persisted session record could not be restored
    #[error("Invalid session state under '{key}': {message}")]
    InvalidSessionState { key: String, message: String },

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Tokio task join error
    #[error("Async task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Generic error for external library errors
    #[error("{context}: {message}")]
    External { context: String, message: String },
}

/// Result type alias using ScanviewError
pub type ScanviewResult<T> = Result<T, ScanviewError>;

impl ScanviewError {
    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a session-state error for a persisted key
    pub fn session(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSessionState {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an external error with context
    pub fn external(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::External {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether the error is handled locally by degrading output
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CatalogMiss { .. } | Self::UnknownSeverity(_))
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for ScanviewError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = ScanviewError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            Some(PathBuf::from("/test/catalogs")),
        );
        assert!(err.to_string().contains("/test/catalogs"));
    }

    #[test]
    fn test_catalog_miss_display() {
        let err = ScanviewError::CatalogMiss {
            issue_id: 5,
            result_id: 1,
        };
        assert!(err.to_string().contains("issue 5"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_backend_error_is_not_recoverable() {
        let err = ScanviewError::BackendUnavailable("host exited".into());
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("host exited"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ScanviewError = io_err.into();
        assert!(matches!(err, ScanviewError::Io { path: None, .. }));
    }
}
