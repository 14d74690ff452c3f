//! Persistent state that survives between bundle builds.
//!
//! This crate owns everything written to disk besides the bundles themselves:
//! the fingerprint store used for incremental rebuild decisions, the binary
//! dependency table read by runtime loaders, and the per-bundle `.info`
//! manifests.

#![warn(missing_docs)]

pub mod bundle_manifest;
pub mod dependency_table;
pub mod error;
pub mod hasher;
pub mod store;

pub use bundle_manifest::BundleManifest;
pub use dependency_table::{BundleRecord, DependencyTable};
pub use error::CacheError;
pub use hasher::SourceHasher;
pub use store::{CacheRecord, FingerprintStore, StoreStatus};
