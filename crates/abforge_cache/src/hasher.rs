//! Asset file hashing.

use std::path::Path;

use abforge_common::{ContentHash, ContentKind};

use crate::error::CacheError;

/// Utility for computing content hashes of asset files.
pub struct SourceHasher;

impl SourceHasher {
    /// Computes the content hash of a single file.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Computes the content hash of an asset according to its kind.
    ///
    /// Built-in resources are never read; they hash to [`ContentHash::BUILTIN`].
    pub fn hash_asset(path: &Path, kind: ContentKind) -> Result<ContentHash, CacheError> {
        match kind {
            ContentKind::BuiltinResource => Ok(ContentHash::BUILTIN),
            ContentKind::Content => Self::hash_file(path),
        }
    }
}
