//! Error types for graph construction.

/// Errors raised while building or reshaping the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Adding an edge would make an asset depend on itself.
    #[error("dependency cycle: {}", chain.join(" -> "))]
    CycleDetected {
        /// Asset paths along the cycle, starting and ending at the same asset.
        chain: Vec<String>,
    },

    /// An asset path was used before it was inserted into the graph.
    #[error("unknown asset `{path}`")]
    UnknownAsset {
        /// The asset path that was not found.
        path: String,
    },
}
