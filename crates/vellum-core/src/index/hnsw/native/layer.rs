//! A single layer of the proximity graph.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Dense internal identifier for a node, assigned in insertion order.
pub type NodeId = usize;

/// One edge of a node's neighbor list, annotated with its cached distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Neighbor node.
    pub id: NodeId,
    /// Distance between the owning node and `id`, computed at insertion time.
    pub distance: f32,
}

impl Neighbor {
    /// Creates a neighbor entry.
    #[must_use]
    pub const fn new(id: NodeId, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Inline storage covers the default M; Mmax0 lists spill to the heap once.
pub type NeighborList = SmallVec<[Neighbor; 16]>;

/// Sorts neighbors by ascending distance, ties broken by insertion order.
pub(crate) fn sort_by_distance(neighbors: &mut [Neighbor]) {
    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
}

/// A single layer in the HNSW hierarchy.
///
/// A node is present in layer L only if its assigned level is >= L.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    /// Adjacency list: node_id -> neighbors with cached distances
    nodes: FxHashMap<NodeId, NeighborList>,
}

impl Layer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns true if `node_id` is a member of this layer.
    #[must_use]
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Number of nodes in this layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the layer has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Neighbors of `node_id`; empty if the node is not in this layer.
    #[must_use]
    pub fn neighbors(&self, node_id: NodeId) -> &[Neighbor] {
        self.nodes.get(&node_id).map_or(&[], |n| n.as_slice())
    }

    /// Node ids of this layer in insertion order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Inserts or replaces the neighbor list of `node_id`.
    pub(crate) fn set_neighbors(&mut self, node_id: NodeId, neighbors: NeighborList) {
        self.nodes.insert(node_id, neighbors);
    }
}
