//! Graph nodes.

use std::collections::BTreeSet;

use abforge_common::{AssetId, ContentKind, ExportKind};

/// Change-detection state of a node for the current run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    /// The asset's content differs from the previous build, or it is new.
    pub file_changed: bool,
    /// The asset's effective dependencies differ from the previous build.
    pub dep_tree_changed: bool,
    /// The bundle must be compiled this run.
    pub needs_rebuild: bool,
    /// Compiling produced output that differs from the previous build.
    pub new_build_output: bool,
}

impl ChangeFlags {
    /// Returns `true` if the node changed on its own account.
    pub fn changed_self(&self) -> bool {
        self.file_changed || self.dep_tree_changed
    }
}

/// One asset in the dependency graph.
#[derive(Debug, Clone)]
pub struct AssetNode {
    /// Project-relative asset path.
    pub path: String,
    /// Whether the asset is a file on disk or an engine resource.
    pub content: ContentKind,
    /// How the asset is exported.
    pub export: ExportKind,
    /// Bundle file name derived from the path.
    pub bundle_name: String,
    /// Set once the node's bundle has been exported this run.
    pub exported: bool,
    /// Change-detection state filled in by the planner.
    pub flags: ChangeFlags,
    pub(crate) depends_on: BTreeSet<AssetId>,
    pub(crate) depended_by: BTreeSet<AssetId>,
}

impl AssetNode {
    pub(crate) fn new(path: &str, content: ContentKind) -> Self {
        Self {
            path: path.to_string(),
            content,
            export: ExportKind::Embedded,
            bundle_name: crate::naming::bundle_name(path),
            exported: false,
            flags: ChangeFlags::default(),
            depends_on: BTreeSet::new(),
            depended_by: BTreeSet::new(),
        }
    }

    /// Direct prerequisites: assets this asset references.
    pub fn depends_on(&self) -> &BTreeSet<AssetId> {
        &self.depends_on
    }

    /// Direct consumers: assets that reference this asset.
    pub fn depended_by(&self) -> &BTreeSet<AssetId> {
        &self.depended_by
    }

    /// Returns `true` for engine resources.
    pub fn is_builtin(&self) -> bool {
        self.content == ContentKind::BuiltinResource
    }

    /// Returns `true` if the asset is published as a bundle of its own.
    ///
    /// Engine resources never are, whatever their classification.
    pub fn is_self_exported(&self) -> bool {
        !self.is_builtin() && self.export.is_bundle()
    }
}
