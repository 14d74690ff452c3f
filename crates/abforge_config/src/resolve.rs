//! Platform resolution: merging global and platform-specific settings into paths.

use crate::error::ConfigError;
use crate::types::{Compression, ProjectConfig};
use std::path::{Path, PathBuf};

/// Platform label used when neither the command line nor the config names one.
const FALLBACK_PLATFORM: &str = "standalone";

/// File name of the fingerprint store inside the per-platform cache directory.
const FINGERPRINT_FILE: &str = "fingerprints.json";

/// A fully resolved platform with every output location made concrete.
#[derive(Debug, Clone)]
pub struct ResolvedPlatform {
    /// The platform name.
    pub name: String,
    /// Directory that receives bundles and their `.info` manifests.
    pub bundle_dir: PathBuf,
    /// Location of the fingerprint store.
    pub cache_file: PathBuf,
    /// Location of the binary dependency table.
    pub dependency_file: PathBuf,
    /// Compression requested from the bundle compiler.
    pub compression: Compression,
}

/// Resolves a platform by merging global output settings with its overrides.
///
/// With no name, falls back to `build.default_platform` and then to a generic
/// label. When `[platforms]` declares any entry, the name must be one of them.
pub fn resolve_platform(
    config: &ProjectConfig,
    project_dir: &Path,
    name: Option<&str>,
) -> Result<ResolvedPlatform, ConfigError> {
    let name = name
        .or(config.build.default_platform.as_deref())
        .unwrap_or(FALLBACK_PLATFORM);

    let overrides = if config.platforms.is_empty() {
        None
    } else {
        Some(
            config
                .platforms
                .get(name)
                .ok_or_else(|| ConfigError::UnknownPlatform(name.to_string()))?,
        )
    };

    let bundle_root = overrides
        .and_then(|p| p.bundle_dir.as_deref())
        .unwrap_or(&config.output.bundle_dir);
    let bundle_dir = project_dir.join(bundle_root).join(name);

    let compression = overrides
        .and_then(|p| p.compression)
        .unwrap_or(config.build.compression);

    Ok(ResolvedPlatform {
        name: name.to_string(),
        dependency_file: bundle_dir.join(&config.output.dependency_file),
        cache_file: project_dir
            .join(&config.output.cache_dir)
            .join(name)
            .join(FINGERPRINT_FILE),
        bundle_dir,
        compression,
    })
}
