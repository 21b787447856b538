//! Error types for the photo cache

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors surfaced by cache operations.
///
/// The type is `Clone` because a single transfer's outcome is handed to every
/// caller waiting on the same photo id.
#[derive(Debug, Clone)]
pub enum PhotoCacheError {
    /// The download descriptor cannot be resolved to a byte stream
    InvalidSource(String),
    /// The fetch failed, timed out, or returned unusable data
    TransferFailure(String),
    /// A filesystem write, rename, or delete failed
    StorageFailure { path: PathBuf, source: Arc<io::Error> },
    /// No entry exists for the requested photo id
    NotFound(String),
}

impl PhotoCacheError {
    pub fn storage(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Self::StorageFailure {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

impl fmt::Display for PhotoCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSource(msg) => write!(f, "Invalid source: {msg}"),
            Self::TransferFailure(msg) => write!(f, "Transfer failed: {msg}"),
            Self::StorageFailure { path, source } => {
                write!(f, "Storage error at {}: {source}", path.display())
            }
            Self::NotFound(id) => write!(f, "Photo not cached: {id}"),
        }
    }
}

impl std::error::Error for PhotoCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StorageFailure { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<tokio::time::error::Elapsed> for PhotoCacheError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::TransferFailure("download timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, PhotoCacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_source_display() {
        let err = PhotoCacheError::InvalidSource("unsupported scheme: ftp".to_string());
        assert_eq!(format!("{}", err), "Invalid source: unsupported scheme: ftp");
    }

    #[test]
    fn test_storage_failure_display_and_source() {
        let err = PhotoCacheError::storage(
            "/cache/abc.jpg",
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        let msg = format!("{}", err);
        assert!(msg.contains("/cache/abc.jpg"));
        assert!(msg.contains("read-only"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_clone_preserves_variant() {
        let err = PhotoCacheError::TransferFailure("connection reset".to_string());
        let cloned = err.clone();
        assert!(matches!(cloned, PhotoCacheError::TransferFailure(msg) if msg == "connection reset"));
    }

    #[test]
    fn test_not_found_display() {
        let err = PhotoCacheError::NotFound("abc123".to_string());
        assert_eq!(format!("{}", err), "Photo not cached: abc123");
    }
}
