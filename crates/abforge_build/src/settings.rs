//! Settings threaded through one build session.

use std::path::{Path, PathBuf};

use abforge_config::{BuildConfig, Compression, ResolvedPlatform};

/// Everything a build session needs to know about where it reads and writes.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Project directory; asset paths are relative to it.
    pub project_dir: PathBuf,
    /// Name of the target platform.
    pub platform: String,
    /// Directory that receives bundles and manifests.
    pub bundle_dir: PathBuf,
    /// Location of the fingerprint store.
    pub cache_file: PathBuf,
    /// Location of the binary dependency table.
    pub dependency_file: PathBuf,
    /// Compression requested from the compiler.
    pub compression: Compression,
    /// Delete bundles in `bundle_dir` that no asset produces any more.
    pub prune_stale: bool,
    /// Rebuild every bundle regardless of the fingerprint store.
    pub force: bool,
    /// Version written into the fingerprint store.
    pub tool_version: String,
}

impl BuildSettings {
    /// Builds settings for a resolved platform.
    pub fn new(project_dir: &Path, platform: &ResolvedPlatform, build: &BuildConfig) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            platform: platform.name.clone(),
            bundle_dir: platform.bundle_dir.clone(),
            cache_file: platform.cache_file.clone(),
            dependency_file: platform.dependency_file.clone(),
            compression: platform.compression,
            prune_stale: build.prune_stale,
            force: false,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Resolves an asset path to its location on disk.
    pub fn asset_file(&self, asset_path: &str) -> PathBuf {
        self.project_dir.join(asset_path)
    }
}
