//! Fingerprint store: what each asset looked like at the end of the last build.
//!
//! The store is a JSON document holding one [`CacheRecord`] per asset path. It
//! is read once when a build starts and rewritten wholesale when it ends; it is
//! the only state carried from one build to the next. It only answers "did
//! anything relevant change?" and is never used to skip dependency discovery.

use std::collections::BTreeMap;
use std::path::Path;

use abforge_common::ContentHash;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CacheError;

/// What the previous build recorded about one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Content hash of the asset file at the end of the previous build.
    pub content_hash: ContentHash,

    /// Fingerprint of the bundle compiled from this asset, if it was compiled.
    #[serde(default)]
    pub output_fingerprint: Option<String>,

    /// Asset paths of the effective dependencies at the end of the previous build.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// How the store came to be when it was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
    /// No store existed at the given location.
    Missing,
    /// A compatible store was loaded.
    Loaded,
    /// A store existed but was unusable and has been replaced by an empty one.
    Discarded {
        /// Why the previous store was discarded.
        reason: String,
    },
}

/// Per-asset fingerprints persisted between builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintStore {
    /// Tool version that produced this store. Records from another version are ignored.
    pub tool_version: String,

    /// Records keyed by asset path.
    pub records: BTreeMap<String, CacheRecord>,
}

impl FingerprintStore {
    /// Creates a new, empty store for the given tool version.
    pub fn new(tool_version: &str) -> Self {
        Self {
            tool_version: tool_version.to_string(),
            records: BTreeMap::new(),
        }
    }

    /// Loads the store at `path`, falling back to an empty store.
    ///
    /// This is fail-safe: a missing, unreadable, corrupt, or incompatible
    /// file yields an empty store, which forces every asset to be treated as
    /// changed. The returned status says which case applied.
    pub fn load(path: &Path, tool_version: &str) -> (Self, StoreStatus) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no fingerprint store at {}", path.display());
                return (Self::new(tool_version), StoreStatus::Missing);
            }
            Err(e) => return Self::discarded(tool_version, format!("unreadable: {e}")),
        };

        let store: Self = match serde_json::from_str(&content) {
            Ok(store) => store,
            Err(e) => return Self::discarded(tool_version, format!("unparsable: {e}")),
        };

        if !store.is_compatible(tool_version) {
            return Self::discarded(
                tool_version,
                format!("written by version {}", store.tool_version),
            );
        }

        debug!(
            "loaded {} fingerprint records from {}",
            store.records.len(),
            path.display()
        );
        (store, StoreStatus::Loaded)
    }

    fn discarded(tool_version: &str, reason: String) -> (Self, StoreStatus) {
        warn!("discarding fingerprint store: {reason}");
        (Self::new(tool_version), StoreStatus::Discarded { reason })
    }

    /// Saves the store to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| CacheError::io(path, e))
    }

    /// Returns `true` if this store was produced by a compatible tool version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.tool_version == current_version
    }

    /// Returns the record of an asset, if the previous build saw it.
    pub fn get(&self, asset_path: &str) -> Option<&CacheRecord> {
        self.records.get(asset_path)
    }

    /// Inserts or replaces the record of an asset.
    pub fn insert(&mut self, asset_path: impl Into<String>, record: CacheRecord) {
        self.records.insert(asset_path.into(), record);
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
