//! Reference discovery: builds the graph by walking references from the roots.
//!
//! The walk is an iterative depth-first search with an explicit stack. An asset
//! whose reference leads back to an asset still on the stack closes a cycle;
//! the cycle is reported and that one reference is skipped, so the rest of the
//! graph is still built.

use std::collections::{BTreeSet, HashSet};

use abforge_common::{AssetId, ContentKind};
use abforge_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use tracing::debug;

use crate::error::GraphError;
use crate::graph::AssetGraph;
use crate::naming::normalize_asset_path;

/// Where discovery learns about assets.
pub trait ReferenceSource {
    /// Returns the asset paths directly referenced by `path`.
    fn references(&self, path: &str) -> std::io::Result<Vec<String>>;

    /// Returns `true` if the asset exists on disk.
    fn exists(&self, path: &str) -> bool;

    /// Returns `true` if the path names an engine-provided resource.
    fn is_builtin(&self, path: &str) -> bool;
}

/// Counts gathered while discovering the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    /// Roots designated as build entry points.
    pub roots: usize,
    /// Assets in the graph after discovery.
    pub assets: usize,
    /// Direct edges in the graph after discovery.
    pub edges: usize,
    /// References skipped because their target does not exist.
    pub missing: usize,
    /// References skipped because they close a cycle.
    pub cycles: usize,
}

struct Frame {
    id: AssetId,
    children: Vec<AssetId>,
    next: usize,
}

/// Discovers every asset reachable from `roots` and inserts it into `graph`.
///
/// Paths are normalized to their canonical project-relative form first, so
/// every spelling of a path names the same node. Roots are designated as
/// build entry points. Missing assets and paths outside the project are
/// reported as warnings and skipped; reference cycles are reported as errors and the
/// closing reference is skipped.
pub fn discover(
    graph: &mut AssetGraph,
    roots: &[String],
    source: &dyn ReferenceSource,
    sink: &DiagnosticSink,
) -> DiscoverySummary {
    let mut summary = DiscoverySummary::default();
    let mut expanded: HashSet<AssetId> = HashSet::new();

    for root in roots {
        let Some(root) = normalize_asset_path(root) else {
            summary.missing += 1;
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::MISSING_REFERENCE,
                    "root asset path is outside the project",
                )
                .with_asset(root.as_str()),
            );
            continue;
        };
        let root = root.as_str();
        if source.is_builtin(root) {
            debug!("ignoring built-in resource {root} as a root");
            continue;
        }
        if !source.exists(root) {
            summary.missing += 1;
            sink.emit(
                Diagnostic::warning(DiagnosticCode::MISSING_REFERENCE, "root asset not found")
                    .with_asset(root),
            );
            continue;
        }
        graph.insert(root, ContentKind::Content);
        let id = match graph.designate_root(root) {
            Ok(id) => id,
            Err(_) => continue,
        };
        summary.roots += 1;
        if expanded.insert(id) {
            walk(graph, id, source, sink, &mut expanded, &mut summary);
        }
    }

    summary.assets = graph.len();
    summary.edges = graph.edge_count();
    debug!(
        "discovered {} assets and {} edges from {} roots",
        summary.assets, summary.edges, summary.roots
    );
    summary
}

fn walk(
    graph: &mut AssetGraph,
    start: AssetId,
    source: &dyn ReferenceSource,
    sink: &DiagnosticSink,
    expanded: &mut HashSet<AssetId>,
    summary: &mut DiscoverySummary,
) {
    let mut stack = vec![expand(graph, start, source, sink, summary)];
    let mut on_stack: HashSet<AssetId> = HashSet::from([start]);

    while let Some(frame) = stack.last_mut() {
        let Some(&child) = frame.children.get(frame.next) else {
            on_stack.remove(&frame.id);
            stack.pop();
            continue;
        };
        frame.next += 1;
        let consumer = frame.id;

        if on_stack.contains(&child) {
            let chain = stack
                .iter()
                .map(|f| f.id)
                .skip_while(|id| *id != child)
                .chain([child])
                .map(|id| graph.path(id).to_string())
                .collect();
            report_cycle(GraphError::CycleDetected { chain }, graph.path(consumer), sink);
            summary.cycles += 1;
            continue;
        }

        if let Err(err) = graph.add_edge(consumer, child) {
            report_cycle(err, graph.path(consumer), sink);
            summary.cycles += 1;
            continue;
        }

        if expanded.insert(child) {
            on_stack.insert(child);
            let frame = expand(graph, child, source, sink, summary);
            stack.push(frame);
        }
    }
}

/// Lists the references of `id`, inserting every existing target.
fn expand(
    graph: &mut AssetGraph,
    id: AssetId,
    source: &dyn ReferenceSource,
    sink: &DiagnosticSink,
    summary: &mut DiscoverySummary,
) -> Frame {
    let mut frame = Frame {
        id,
        children: Vec::new(),
        next: 0,
    };
    if graph.node(id).is_builtin() {
        return frame;
    }

    let path = graph.path(id).to_string();
    let references = match source.references(&path) {
        Ok(refs) => refs,
        Err(e) => {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::UNREADABLE_REFERENCES,
                    format!("could not list references: {e}"),
                )
                .with_asset(path.as_str()),
            );
            return frame;
        }
    };

    let mut seen = BTreeSet::new();
    for raw in references {
        let Some(reference) = normalize_asset_path(&raw) else {
            summary.missing += 1;
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::MISSING_REFERENCE,
                    format!("reference `{raw}` is outside the project, skipping"),
                )
                .with_asset(path.as_str()),
            );
            continue;
        };
        if reference == path || !seen.insert(reference.clone()) {
            continue;
        }
        let kind = if source.is_builtin(&reference) {
            ContentKind::BuiltinResource
        } else if source.exists(&reference) {
            ContentKind::Content
        } else {
            summary.missing += 1;
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::MISSING_REFERENCE,
                    format!("referenced asset `{reference}` not found, skipping"),
                )
                .with_asset(path.as_str()),
            );
            continue;
        };
        frame.children.push(graph.insert(&reference, kind));
    }
    frame
}

fn report_cycle(err: GraphError, consumer: &str, sink: &DiagnosticSink) {
    sink.emit(
        Diagnostic::error(DiagnosticCode::CYCLE, err.to_string())
            .with_asset(consumer)
            .with_help("the closing reference was skipped; break the loop in the asset data"),
    );
}
