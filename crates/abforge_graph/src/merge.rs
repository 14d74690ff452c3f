//! Re-attachment of assets shared by several direct consumers.

use abforge_common::{AssetId, ExportKind};
use tracing::debug;

use crate::error::GraphError;
use crate::graph::AssetGraph;

/// Re-attaches every embedded asset that has more than one direct consumer.
///
/// Each such asset is detached from all of its consumers and linked back to
/// each of them through [`AssetGraph::add_edge`], so that consumers reaching
/// it through another consumer lose their direct edge. Classification is left
/// to [`classify`](crate::classify), which sees the complete set of bundles
/// reaching each asset.
///
/// Returns the number of assets re-attached.
pub fn merge_shared(graph: &mut AssetGraph) -> Result<usize, GraphError> {
    let candidates: Vec<AssetId> = graph
        .iter()
        .filter(|(_, node)| {
            node.export == ExportKind::Embedded
                && !node.is_builtin()
                && node.depended_by().len() > 1
        })
        .map(|(id, _)| id)
        .collect();

    let mut merged = 0;
    for id in candidates {
        let consumers: Vec<AssetId> = graph.node(id).depended_by().iter().copied().collect();
        if consumers.len() < 2 {
            continue;
        }
        for &consumer in &consumers {
            graph.remove_edge(consumer, id);
        }
        for &consumer in &consumers {
            graph.add_edge(consumer, id)?;
        }
        debug!(
            "re-attached {} to {} consumers",
            graph.path(id),
            graph.node(id).depended_by().len()
        );
        merged += 1;
    }
    Ok(merged)
}
