//! Error types for cache, manifest and dependency table operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing persisted build state.
///
/// Reads of the fingerprint store are fail-safe and never surface these;
/// writes are fatal for the run, since partial state would mislead the next
/// incremental build.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A file was recognized but its body is inconsistent.
    #[error("malformed data: {reason}")]
    Malformed {
        /// Description of the inconsistency.
        reason: String,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CacheError::Malformed {
            reason: reason.into(),
        }
    }
}
