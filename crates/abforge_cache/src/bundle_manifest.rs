//! Per-bundle text manifests read by runtime loaders.
//!
//! One manifest is written next to every published bundle as
//! `<bundle_name>.info`:
//!
//! ```text
//! hero.prefab.ab          bundle name
//! 9f2c...                 output fingerprint
//! 2                       dependency count
//! hero.prefab             source file name
//! fx.smoke.prefab.ab      one dependency bundle name per line
//! materials.shared.mat.ab
//! ```

use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// File extension of bundle manifests.
pub const MANIFEST_EXTENSION: &str = "info";

/// The manifest of one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleManifest {
    /// Name of the bundle this manifest describes.
    pub bundle_name: String,
    /// Fingerprint of the bundle's compiled output.
    pub output_fingerprint: String,
    /// File name of the bundle's primary asset.
    pub source_file_name: String,
    /// Bundle names this bundle depends on, sorted.
    pub dependencies: Vec<String>,
}

impl BundleManifest {
    /// Creates a manifest. Dependencies are sorted and deduplicated so that
    /// the rendered text does not depend on traversal order.
    pub fn new(
        bundle_name: impl Into<String>,
        output_fingerprint: impl Into<String>,
        source_file_name: impl Into<String>,
        mut dependencies: Vec<String>,
    ) -> Self {
        dependencies.sort();
        dependencies.dedup();
        Self {
            bundle_name: bundle_name.into(),
            output_fingerprint: output_fingerprint.into(),
            source_file_name: source_file_name.into(),
            dependencies,
        }
    }

    /// Renders the manifest text, one field per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in [
            self.bundle_name.as_str(),
            self.output_fingerprint.as_str(),
            &self.dependencies.len().to_string(),
            self.source_file_name.as_str(),
        ] {
            out.push_str(line);
            out.push('\n');
        }
        for dep in &self.dependencies {
            out.push_str(dep);
            out.push('\n');
        }
        out
    }

    /// Parses manifest text produced by [`render`](Self::render).
    pub fn parse(text: &str) -> Result<Self, CacheError> {
        let mut lines = text.lines();
        let mut field = |name: &str| {
            lines
                .next()
                .map(str::to_string)
                .ok_or_else(|| CacheError::malformed(format!("manifest is missing the {name}")))
        };
        let bundle_name = field("bundle name")?;
        let output_fingerprint = field("output fingerprint")?;
        let count_line = field("dependency count")?;
        let source_file_name = field("source file name")?;
        let count: usize = count_line.trim().parse().map_err(|_| {
            CacheError::malformed(format!("invalid dependency count {count_line:?}"))
        })?;

        let dependencies: Vec<String> = lines
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if dependencies.len() != count {
            return Err(CacheError::malformed(format!(
                "manifest declares {count} dependencies but lists {}",
                dependencies.len()
            )));
        }

        Ok(Self {
            bundle_name,
            output_fingerprint,
            source_file_name,
            dependencies,
        })
    }

    /// Path of this manifest inside `bundle_dir`.
    pub fn path_in(&self, bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(format!("{}.{MANIFEST_EXTENSION}", self.bundle_name))
    }

    /// Writes the manifest into `bundle_dir`, returning the written path.
    pub fn write_to(&self, bundle_dir: &Path) -> Result<PathBuf, CacheError> {
        let path = self.path_in(bundle_dir);
        std::fs::write(&path, self.render()).map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }

    /// Reads a manifest file.
    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let text = std::fs::read_to_string(path).map_err(|e| CacheError::io(path, e))?;
        Self::parse(&text)
    }
}
