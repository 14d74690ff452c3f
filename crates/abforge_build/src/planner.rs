//! Incremental build planning.
//!
//! For every asset the planner compares the current content hash and the
//! current effective dependencies against the fingerprint store, then spreads
//! the result through the graph:
//!
//! - a bundle must be rebuilt when the asset itself or anything it packs or
//!   depends on changed, and
//! - a bundle must be rebuilt when any bundle that uses it is rebuilt.

use std::collections::BTreeSet;
use std::path::Path;

use abforge_cache::{CacheError, FingerprintStore, SourceHasher};
use abforge_common::{AssetId, ContentHash, ContentKind};
use abforge_graph::{AssetGraph, ChangeFlags};
use rayon::prelude::*;
use tracing::debug;

/// What the planner decided for one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanEntry {
    /// Current content hash, or `None` if the file could not be read.
    pub hash: Option<ContentHash>,
    /// Asset paths of the current effective dependencies, sorted.
    pub dependencies: Vec<String>,
    /// Output fingerprint recorded by the previous build.
    pub previous_fingerprint: Option<String>,
}

/// Counts of the planner's decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    /// Assets examined.
    pub assets: usize,
    /// Assets whose content changed or that are new.
    pub file_changed: usize,
    /// Assets whose effective dependencies changed.
    pub dep_tree_changed: usize,
    /// Assets flagged for rebuild.
    pub needs_rebuild: usize,
    /// Bundles eligible for export this run.
    pub exportable: usize,
}

/// Per-asset planning results, indexed like the graph.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    entries: Vec<PlanEntry>,
    /// Aggregate counts.
    pub summary: PlanSummary,
}

impl Plan {
    /// Returns the entry of an asset.
    pub fn entry(&self, id: AssetId) -> &PlanEntry {
        &self.entries[id.index()]
    }

    /// Returns `true` if the asset's bundle should be compiled now: it is
    /// exported on its own, has not been exported yet, needs a rebuild, and
    /// its file could be read.
    pub fn should_export(&self, graph: &AssetGraph, id: AssetId) -> bool {
        let node = graph.node(id);
        node.is_self_exported()
            && !node.exported
            && node.flags.needs_rebuild
            && self.entries[id.index()].hash.is_some()
    }
}

/// Hashes every asset in the graph in parallel.
///
/// Built-in resources hash to [`ContentHash::BUILTIN`] without touching disk.
pub fn hash_assets(
    graph: &AssetGraph,
    project_dir: &Path,
) -> Vec<Result<ContentHash, CacheError>> {
    let files: Vec<(ContentKind, std::path::PathBuf)> = graph
        .iter()
        .map(|(_, node)| (node.content, project_dir.join(&node.path)))
        .collect();
    files
        .par_iter()
        .map(|(kind, file)| SourceHasher::hash_asset(file, *kind))
        .collect()
}

/// Computes change flags for every asset and stores them on the graph.
///
/// `hashes` is indexed like the graph. With `force`, the store is ignored
/// entirely: every asset counts as changed and no previous output fingerprint
/// is carried, so every compiled bundle is published again.
pub fn plan(
    graph: &mut AssetGraph,
    store: &FingerprintStore,
    hashes: &[Option<ContentHash>],
    force: bool,
) -> Plan {
    let mut summary = PlanSummary {
        assets: graph.len(),
        ..PlanSummary::default()
    };
    let mut entries = Vec::with_capacity(graph.len());

    let ids: Vec<AssetId> = graph.ids().collect();
    for &id in &ids {
        let hash = hashes.get(id.index()).copied().flatten();
        let dependencies: Vec<String> = graph
            .collect_effective_dependencies(id)
            .into_iter()
            .map(|dep| graph.path(dep).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cached = if force {
            None
        } else {
            store.get(graph.path(id))
        };

        let file_changed = match (cached, hash) {
            (Some(rec), Some(hash)) => rec.content_hash != hash,
            _ => true,
        };
        let dep_tree_changed = cached.is_some_and(|rec| {
            rec.dependencies.iter().collect::<BTreeSet<_>>()
                != dependencies.iter().collect::<BTreeSet<_>>()
        });
        if file_changed {
            debug!("content changed: {}", graph.path(id));
            summary.file_changed += 1;
        }
        if dep_tree_changed {
            debug!("dependencies changed: {}", graph.path(id));
            summary.dep_tree_changed += 1;
        }

        graph.node_mut(id).flags = ChangeFlags {
            file_changed,
            dep_tree_changed,
            ..ChangeFlags::default()
        };
        entries.push(PlanEntry {
            hash,
            dependencies,
            previous_fingerprint: cached.and_then(|rec| rec.output_fingerprint.clone()),
        });
    }

    propagate(graph);

    let mut plan = Plan { entries, summary };
    for &id in &ids {
        if graph.node(id).flags.needs_rebuild {
            plan.summary.needs_rebuild += 1;
        }
        if plan.should_export(graph, id) {
            plan.summary.exportable += 1;
        }
    }
    debug!(
        "{} of {} assets need a rebuild, {} bundles to export",
        plan.summary.needs_rebuild, plan.summary.assets, plan.summary.exportable
    );
    plan
}

/// Spreads change flags: first from prerequisites to consumers, then from
/// rebuilt consumers down to everything they use.
fn propagate(graph: &mut AssetGraph) {
    let order = graph.consumers_first_order();
    let mut changed_below = vec![false; graph.len()];
    for &id in order.iter().rev() {
        let node = graph.node(id);
        changed_below[id.index()] = node.flags.changed_self()
            || node.depends_on().iter().any(|p| changed_below[p.index()]);
    }

    let mut needs_rebuild = vec![false; graph.len()];
    for &id in &order {
        let node = graph.node(id);
        needs_rebuild[id.index()] = changed_below[id.index()]
            || node.depended_by().iter().any(|c| needs_rebuild[c.index()]);
    }

    for id in order {
        graph.node_mut(id).flags.needs_rebuild = needs_rebuild[id.index()];
    }
}
