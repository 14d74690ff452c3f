//! Configuration types deserialized from `abforge.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `abforge.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Root discovery and packing settings.
    pub build: BuildConfig,
    /// Where bundles, manifests and the fingerprint store are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Named platform overrides (e.g., "android", "ios").
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformConfig>,
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
}

/// Settings controlling which assets become bundles and how they are packed.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Directories scanned for root bundle candidates.
    pub roots: Vec<String>,
    /// File extensions (without the dot) that qualify as root candidates.
    #[serde(default = "default_root_extensions")]
    pub root_extensions: Vec<String>,
    /// Asset path prefixes identifying built-in engine resources.
    #[serde(default = "default_builtin_prefixes")]
    pub builtin_prefixes: Vec<String>,
    /// Compression requested from the bundle compiler.
    #[serde(default)]
    pub compression: Compression,
    /// Delete bundles in the output directory that the current build no longer produces.
    #[serde(default)]
    pub prune_stale: bool,
    /// Platform used when none is given on the command line.
    #[serde(default)]
    pub default_platform: Option<String>,
}

fn default_root_extensions() -> Vec<String> {
    vec!["prefab".to_string(), "unity".to_string()]
}

fn default_builtin_prefixes() -> Vec<String> {
    vec![
        "Resources/unity_builtin_extra".to_string(),
        "Library/unity default resources".to_string(),
    ]
}

/// Output locations, relative to the project root.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one subdirectory of bundles per platform.
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: String,
    /// Directory holding one fingerprint store per platform.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// File name of the binary dependency table inside the bundle directory.
    #[serde(default = "default_dependency_file")]
    pub dependency_file: String,
}

fn default_bundle_dir() -> String {
    "AssetBundles".to_string()
}

fn default_cache_dir() -> String {
    ".abforge".to_string()
}

fn default_dependency_file() -> String {
    "dep.all".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bundle_dir: default_bundle_dir(),
            cache_dir: default_cache_dir(),
            dependency_file: default_dependency_file(),
        }
    }
}

/// Per-platform overrides of the global settings.
#[derive(Debug, Default, Deserialize)]
pub struct PlatformConfig {
    /// Replaces `output.bundle_dir` for this platform.
    #[serde(default)]
    pub bundle_dir: Option<String>,
    /// Replaces `build.compression` for this platform.
    #[serde(default)]
    pub compression: Option<Compression>,
}

/// Compression applied by the bundle compiler.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Store bundles uncompressed.
    None,
    /// Chunk-based LZ4 compression (default).
    #[default]
    Lz4,
    /// Whole-file LZMA compression.
    Lzma,
}
