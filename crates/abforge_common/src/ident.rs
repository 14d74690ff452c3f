//! Interned asset paths used as stable node keys in the dependency graph.

use lasso::Rodeo;
use serde::{Deserialize, Serialize};

/// A stable key for an asset path within one build session.
///
/// Keys are handed out densely, starting at zero, in first-seen order, so an
/// `AssetId` doubles as an index into the graph's node arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct AssetId(u32);

impl AssetId {
    /// Creates an `AssetId` from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this id.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns this id as an arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// SAFETY: `AssetId` wraps a `u32`, which always fits in a `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for AssetId {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(AssetId)
    }
}

/// String interner mapping asset paths to dense [`AssetId`]s.
///
/// Backed by [`lasso::Rodeo`]; the graph is built single-threaded, so the
/// non-threaded interner is sufficient.
pub struct PathInterner {
    rodeo: Rodeo<AssetId>,
}

impl PathInterner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns a path, returning its id. Re-interning returns the same id.
    pub fn intern(&mut self, path: &str) -> AssetId {
        self.rodeo.get_or_intern(path)
    }

    /// Returns the id of an already interned path.
    pub fn get(&self, path: &str) -> Option<AssetId> {
        self.rodeo.get(path)
    }

    /// Resolves an id back to its path.
    ///
    /// # Panics
    ///
    /// Panics if the id was not created by this interner.
    pub fn resolve(&self, id: AssetId) -> &str {
        self.rodeo.resolve(&id)
    }

    /// Number of interned paths.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let mut interner = PathInterner::new();
        let id = interner.intern("Assets/Prefabs/hero.prefab");
        assert_eq!(interner.resolve(id), "Assets/Prefabs/hero.prefab");
    }

    #[test]
    fn same_path_same_id() {
        let mut interner = PathInterner::new();
        let a = interner.intern("Assets/a.mat");
        let b = interner.intern("Assets/a.mat");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn ids_are_dense_in_first_seen_order() {
        let mut interner = PathInterner::new();
        let a = interner.intern("Assets/a.mat");
        let b = interner.intern("Assets/b.mat");
        let c = interner.intern("Assets/c.mat");
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
    }

    #[test]
    fn get_does_not_intern() {
        let interner = PathInterner::new();
        assert!(interner.get("Assets/missing.png").is_none());
        assert!(interner.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let id = AssetId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
