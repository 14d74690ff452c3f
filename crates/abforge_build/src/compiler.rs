//! The external bundle compiler.

use std::path::PathBuf;

use abforge_common::AssetId;
use abforge_config::Compression;

/// One bundle to compile.
///
/// Jobs are owned snapshots of the graph so that they can be compiled in
/// parallel without touching it.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Graph node of the bundle's primary asset.
    pub asset: AssetId,
    /// Project-relative path of the primary asset.
    pub asset_path: String,
    /// File name of the bundle to produce.
    pub bundle_name: String,
    /// Primary asset file.
    pub source: PathBuf,
    /// Files of the assets packed into the bundle besides the primary asset.
    pub embedded: Vec<PathBuf>,
    /// Requested compression.
    pub compression: Compression,
}

/// Output of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledBundle {
    /// Bundle bytes to publish.
    pub bytes: Vec<u8>,
    /// Fingerprint of the output; equal fingerprints mean equal bundles.
    pub fingerprint: String,
}

/// Failure to compile one bundle.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// An input file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The unreadable input.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler rejected the input.
    #[error("{reason}")]
    Failed {
        /// Why the compile failed.
        reason: String,
    },
}

/// Turns an asset and the assets embedded in it into a bundle.
///
/// Compiles run on worker threads, one job per call.
pub trait BundleCompiler: Sync {
    /// Compiles one bundle.
    fn compile(&self, job: &CompileJob) -> Result<CompiledBundle, CompileError>;
}
