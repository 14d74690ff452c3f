//! Shared foundational types used across the abforge asset bundler.
//!
//! This crate provides content hashing, interned asset paths, and the
//! content/export classification vocabulary shared by the graph, the
//! fingerprint store and the dependency table codec.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod kind;

pub use hash::ContentHash;
pub use ident::{AssetId, PathInterner};
pub use kind::{ContentKind, ExportKind, UnknownExportCode};
