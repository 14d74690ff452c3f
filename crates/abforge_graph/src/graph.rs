//! The asset dependency graph.
//!
//! Nodes live in an arena indexed by [`AssetId`]; ids are handed out by a
//! [`PathInterner`], so a path always maps to the same node. Edges are stored
//! twice, as prerequisites on the consumer and as consumers on the
//! prerequisite, and the two sets are always exact inverses.
//!
//! The graph is kept transitively reduced: [`AssetGraph::add_edge`] refuses an
//! edge that an existing path already implies, and drops any direct edge that
//! a newly inserted edge makes redundant. The resulting edge set depends only
//! on the reachability relation, not on insertion order.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use abforge_common::{AssetId, ContentKind, ExportKind, PathInterner};
use tracing::trace;

use crate::error::GraphError;
use crate::node::AssetNode;

/// Outcome of [`AssetGraph::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// The edge was inserted.
    Inserted,
    /// The consumer already reaches the prerequisite; nothing changed.
    AlreadyReachable,
    /// The edge would point from an asset to itself; nothing changed.
    SelfReference,
}

#[derive(Clone, Copy)]
enum Direction {
    Prerequisites,
    Consumers,
}

/// Dependency graph of the assets in one build.
#[derive(Default)]
pub struct AssetGraph {
    interner: PathInterner,
    nodes: Vec<AssetNode>,
}

impl AssetGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an asset, returning its id.
    ///
    /// Inserting a path that is already present returns the existing id and
    /// leaves the node untouched.
    pub fn insert(&mut self, path: &str, content: ContentKind) -> AssetId {
        let id = self.interner.intern(path);
        if id.index() == self.nodes.len() {
            self.nodes.push(AssetNode::new(path, content));
        }
        id
    }

    /// Returns the id of an asset path, if it has been inserted.
    pub fn lookup(&self, path: &str) -> Option<AssetId> {
        self.interner.get(path)
    }

    /// Returns the id of an asset path that must already be in the graph.
    pub fn require(&self, path: &str) -> Result<AssetId, GraphError> {
        self.lookup(path).ok_or_else(|| GraphError::UnknownAsset {
            path: path.to_string(),
        })
    }

    /// Marks an inserted asset as a build entry point.
    pub fn designate_root(&mut self, path: &str) -> Result<AssetId, GraphError> {
        let id = self.require(path)?;
        self.nodes[id.index()].export = ExportKind::Root;
        Ok(id)
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this graph.
    pub fn node(&self, id: AssetId) -> &AssetNode {
        &self.nodes[id.index()]
    }

    /// Returns the node with the given id mutably.
    ///
    /// Edges cannot be changed through the returned reference.
    pub fn node_mut(&mut self, id: AssetId) -> &mut AssetNode {
        &mut self.nodes[id.index()]
    }

    /// Returns the asset path of a node.
    pub fn path(&self, id: AssetId) -> &str {
        &self.nodes[id.index()].path
    }

    /// Number of assets in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph holds no assets.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of direct edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.depends_on.len()).sum()
    }

    /// Iterates over all ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = AssetId> {
        (0..self.nodes.len() as u32).map(AssetId::from_raw)
    }

    /// Iterates over all nodes with their ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetId, &AssetNode)> {
        self.ids().zip(self.nodes.iter())
    }

    /// Records that `consumer` references `prerequisite`.
    ///
    /// Returns an error, and leaves the graph unchanged, if `prerequisite`
    /// already depends on `consumer`.
    pub fn add_edge(
        &mut self,
        consumer: AssetId,
        prerequisite: AssetId,
    ) -> Result<EdgeInsert, GraphError> {
        if consumer == prerequisite {
            return Ok(EdgeInsert::SelfReference);
        }
        if self.depends_on_transitively(consumer, prerequisite) {
            return Ok(EdgeInsert::AlreadyReachable);
        }
        if let Some(back) = self.path_between(prerequisite, consumer) {
            let chain = std::iter::once(consumer)
                .chain(back)
                .map(|id| self.path(id).to_string())
                .collect();
            return Err(GraphError::CycleDetected { chain });
        }

        self.link(consumer, prerequisite);

        // Every direct edge from an ancestor of the consumer into the
        // prerequisite's subtree is now implied by a path through the new edge.
        let ancestors = self.closure(consumer, Direction::Consumers);
        let descendants = self.closure(prerequisite, Direction::Prerequisites);
        let redundant: Vec<(AssetId, AssetId)> = ancestors
            .iter()
            .flat_map(|&a| {
                self.nodes[a.index()]
                    .depends_on
                    .iter()
                    .filter(|d| descendants.contains(*d))
                    .map(move |&d| (a, d))
            })
            .filter(|&edge| edge != (consumer, prerequisite))
            .collect();
        for (a, d) in redundant {
            trace!("dropping implied edge {} -> {}", self.path(a), self.path(d));
            self.unlink(a, d);
        }

        Ok(EdgeInsert::Inserted)
    }

    /// Removes the direct edge from `consumer` to `prerequisite`, returning
    /// whether it existed.
    pub fn remove_edge(&mut self, consumer: AssetId, prerequisite: AssetId) -> bool {
        self.unlink(consumer, prerequisite)
    }

    /// Returns `true` if `from` reaches `to` through one or more edges.
    pub fn depends_on_transitively(&self, from: AssetId, to: AssetId) -> bool {
        let mut seen = HashSet::new();
        let mut stack: Vec<AssetId> =
            self.nodes[from.index()].depends_on.iter().copied().collect();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.nodes[id.index()].depends_on.iter().copied());
            }
        }
        false
    }

    /// Returns the bundles a node's bundle depends on.
    ///
    /// Follows prerequisites, stopping at every asset that is exported on its
    /// own and looking through every asset that is not.
    pub fn collect_effective_dependencies(&self, id: AssetId) -> BTreeSet<AssetId> {
        let mut out = BTreeSet::new();
        self.walk_embedded(id, |node_id, node| {
            if node.is_self_exported() {
                out.insert(node_id);
            }
        });
        out
    }

    /// Returns the assets packed into a node's bundle besides the node itself,
    /// sorted by path.
    ///
    /// These are the content assets reachable without passing through an
    /// asset that is exported on its own.
    pub fn collect_embedded_assets(&self, id: AssetId) -> Vec<AssetId> {
        let mut out = Vec::new();
        self.walk_embedded(id, |node_id, node| {
            if !node.is_self_exported() && !node.is_builtin() {
                out.push(node_id);
            }
        });
        out.sort_by(|a, b| self.path(*a).cmp(self.path(*b)));
        out
    }

    /// Returns every node ordered so that each node comes after all of its
    /// consumers.
    pub fn consumers_first_order(&self) -> Vec<AssetId> {
        const NEW: u8 = 0;
        const ENTERED: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![NEW; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for start in self.ids() {
            if state[start.index()] != NEW {
                continue;
            }
            let mut stack = vec![(start, false)];
            while let Some((id, consumers_done)) = stack.pop() {
                if consumers_done {
                    state[id.index()] = DONE;
                    order.push(id);
                    continue;
                }
                if state[id.index()] != NEW {
                    continue;
                }
                state[id.index()] = ENTERED;
                stack.push((id, true));
                for &c in self.nodes[id.index()].depended_by.iter().rev() {
                    if state[c.index()] == NEW {
                        stack.push((c, false));
                    }
                }
            }
        }
        order
    }

    /// Visits every asset reachable from `id` through prerequisites without
    /// passing through an asset exported on its own. Such assets are visited
    /// but not expanded.
    fn walk_embedded(&self, id: AssetId, mut visit: impl FnMut(AssetId, &AssetNode)) {
        let mut seen = HashSet::new();
        let mut stack: Vec<AssetId> =
            self.nodes[id.index()].depends_on.iter().copied().collect();
        while let Some(dep) = stack.pop() {
            if !seen.insert(dep) {
                continue;
            }
            let node = &self.nodes[dep.index()];
            visit(dep, node);
            if !node.is_self_exported() {
                stack.extend(node.depends_on.iter().copied());
            }
        }
    }

    fn edges(&self, id: AssetId, direction: Direction) -> &BTreeSet<AssetId> {
        let node = &self.nodes[id.index()];
        match direction {
            Direction::Prerequisites => &node.depends_on,
            Direction::Consumers => &node.depended_by,
        }
    }

    /// `start` plus every node reachable from it in `direction`.
    fn closure(&self, start: AssetId, direction: Direction) -> HashSet<AssetId> {
        let mut seen = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            for &next in self.edges(id, direction) {
                if seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Shortest prerequisite path from `from` to `to`, both included.
    fn path_between(&self, from: AssetId, to: AssetId) -> Option<Vec<AssetId>> {
        let mut parent: HashMap<AssetId, AssetId> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(id) = queue.pop_front() {
            if id == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(&p) = parent.get(&cur) {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
            for &next in &self.nodes[id.index()].depends_on {
                if next != from && !parent.contains_key(&next) {
                    parent.insert(next, id);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn link(&mut self, consumer: AssetId, prerequisite: AssetId) {
        self.nodes[consumer.index()].depends_on.insert(prerequisite);
        self.nodes[prerequisite.index()].depended_by.insert(consumer);
    }

    fn unlink(&mut self, consumer: AssetId, prerequisite: AssetId) -> bool {
        let removed = self.nodes[consumer.index()].depends_on.remove(&prerequisite);
        self.nodes[prerequisite.index()].depended_by.remove(&consumer);
        removed
    }
}
