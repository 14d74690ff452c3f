//! Run-fatal build errors.

use std::path::PathBuf;

use abforge_cache::CacheError;
use abforge_graph::GraphError;

/// Errors that abort a whole build.
///
/// Failures confined to one bundle are reported as diagnostics instead and
/// the rest of the batch continues.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Writing a bundle, manifest or output directory failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Persisting the dependency table or fingerprint store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The graph could not be reshaped.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
