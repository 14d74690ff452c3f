//! Asset dependency graph and the passes that shape it before a build.
//!
//! The graph is an arena of [`AssetNode`]s keyed by interned asset paths. Every
//! node keeps two mirrored edge sets, prerequisites and consumers, and the
//! graph keeps only direct edges: an edge implied by a longer path is dropped
//! as soon as the longer path exists.
//!
//! A build runs three single-threaded passes over the graph, in order:
//!
//! 1. [`discover`] walks references from the build roots and inserts edges.
//! 2. [`merge_shared`] re-attaches assets that more than one consumer
//!    references directly.
//! 3. [`classify`] promotes assets reachable from more than one bundle to
//!    standalone bundles.

#![warn(missing_docs)]

pub mod classify;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod merge;
pub mod naming;
pub mod node;

pub use classify::classify;
pub use discovery::{discover, DiscoverySummary, ReferenceSource};
pub use error::GraphError;
pub use graph::{AssetGraph, EdgeInsert};
pub use merge::merge_shared;
pub use naming::{bundle_name, normalize_asset_path, short_name, BUNDLE_EXTENSION};
pub use node::{AssetNode, ChangeFlags};
