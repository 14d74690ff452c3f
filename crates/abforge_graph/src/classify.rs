//! Final export classification before bundles are built.
//!
//! Nodes are finalized consumers first, so that when an asset is examined
//! every asset that reaches it already has its final classification. An
//! embedded asset whose consumers lead to more than one bundle is promoted to
//! a standalone bundle of its own. Roots are never changed and nothing is
//! ever demoted.

use std::collections::BTreeSet;

use abforge_common::{AssetId, ExportKind};
use tracing::debug;

use crate::graph::AssetGraph;

/// Promotes every embedded asset reachable from more than one bundle to
/// [`ExportKind::Standalone`], returning the number of promotions.
pub fn classify(graph: &mut AssetGraph) -> usize {
    // Bundles reaching each still-embedded asset, filled in consumers first.
    let mut reaching: Vec<Option<BTreeSet<AssetId>>> = vec![None; graph.len()];
    let mut promoted = 0;

    for id in graph.consumers_first_order() {
        let node = graph.node(id);
        if node.export != ExportKind::Embedded || node.is_builtin() {
            continue;
        }

        let mut roots = BTreeSet::new();
        for &consumer in node.depended_by() {
            if graph.node(consumer).export.is_bundle() {
                roots.insert(consumer);
            } else if let Some(upstream) = &reaching[consumer.index()] {
                roots.extend(upstream.iter().copied());
            }
        }

        if roots.len() > 1 {
            debug!(
                "{} is reached by {} bundles, exporting standalone",
                graph.path(id),
                roots.len()
            );
            graph.node_mut(id).export = ExportKind::Standalone;
            promoted += 1;
        } else {
            reaching[id.index()] = Some(roots);
        }
    }
    promoted
}
