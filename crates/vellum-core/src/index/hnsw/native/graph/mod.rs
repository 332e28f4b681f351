//! HNSW Graph Structure
//!
//! Implements the hierarchical navigable small world graph structure
//! as described in the Malkov & Yashunin paper.
//!
//! The graph only knows dense [`NodeId`]s. Vectors are read through a
//! [`VectorSource`], which may hit a durable store and therefore fail;
//! every read happens before any edit is committed.
//!
//! # Module Organization
//!
//! - `insert`: two-phase insertion (plan, then commit) and layer growth
//! - `search`: k-NN search, greedy descent and layer-level beam search
//! - `neighbors`: diversity heuristic and symmetric edge staging

mod insert;
mod neighbors;
mod search;

use super::distance::DistanceEngine;
use super::layer::{Layer, NodeId};
use crate::index::hnsw::level::LevelGenerator;
use crate::index::hnsw::params::HnswParams;

/// Read access to node vectors during graph traversal.
pub trait VectorSource {
    /// Returns the vector of `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector cannot be read (store failure, or a
    /// node whose vector was never backed in).
    fn vector(&self, node: NodeId) -> crate::Result<Vec<f32>>;
}

/// Exposes a node that is being inserted before it is committed.
pub(crate) struct WithPending<'a, V: VectorSource + ?Sized> {
    inner: &'a V,
    node: NodeId,
    vector: &'a [f32],
}

impl<'a, V: VectorSource + ?Sized> WithPending<'a, V> {
    pub(crate) fn new(inner: &'a V, node: NodeId, vector: &'a [f32]) -> Self {
        Self {
            inner,
            node,
            vector,
        }
    }
}

impl<V: VectorSource + ?Sized> VectorSource for WithPending<'_, V> {
    fn vector(&self, node: NodeId) -> crate::Result<Vec<f32>> {
        if node == self.node {
            Ok(self.vector.to_vec())
        } else {
            self.inner.vector(node)
        }
    }
}

/// Native HNSW graph.
///
/// # Type Parameters
///
/// * `D` - Distance engine (built-in metric or custom closure)
#[derive(Debug, Clone)]
pub struct NativeHnsw<D: DistanceEngine> {
    /// Distance computation engine
    pub(in crate::index::hnsw::native) distance: D,
    /// Hierarchical layers (layer 0 = bottom, dense connections)
    pub(in crate::index::hnsw::native) layers: Vec<Layer>,
    /// Entry point for search (member of the top layer)
    pub(in crate::index::hnsw::native) entry_point: Option<NodeId>,
    /// Number of nodes in the graph
    pub(in crate::index::hnsw::native) count: usize,
    /// Seeded layer assignment
    pub(in crate::index::hnsw::native) levels: LevelGenerator,
    /// Construction parameters
    pub(in crate::index::hnsw::native) params: HnswParams,
}

impl<D: DistanceEngine> NativeHnsw<D> {
    /// Creates an empty graph. `params.seed` must already be resolved.
    #[must_use]
    pub fn new(distance: D, params: HnswParams, seed: u64) -> Self {
        Self {
            distance,
            layers: Vec::new(),
            entry_point: None,
            count: 0,
            levels: LevelGenerator::new(seed, params.max_connections),
            params,
        }
    }

    /// Rebuilds a graph from already-validated parts.
    ///
    /// The level generator is fast-forwarded by `count` draws so inserts
    /// resume the sequence the original graph would have continued with.
    pub(crate) fn from_parts(
        distance: D,
        params: HnswParams,
        seed: u64,
        layers: Vec<Layer>,
        entry_point: Option<NodeId>,
        count: usize,
    ) -> Self {
        let mut levels = LevelGenerator::new(seed, params.max_connections);
        levels.skip(count as u64);
        Self {
            distance,
            layers,
            entry_point,
            count,
            levels,
            params,
        }
    }

    /// Returns the number of elements in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of layers, 0 for an empty graph.
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Layer `layer`, if it exists.
    #[must_use]
    pub fn layer(&self, layer: usize) -> Option<&Layer> {
        self.layers.get(layer)
    }

    /// Current entry point.
    #[must_use]
    pub fn entry_point(&self) -> Option<NodeId> {
        self.entry_point
    }

    /// Construction parameters.
    #[must_use]
    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Seed of the level generator.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.levels.seed()
    }

    /// Distance engine.
    #[must_use]
    pub fn distance_engine(&self) -> &D {
        &self.distance
    }

    /// Computes the distance between two vectors using this index's distance engine.
    #[inline]
    #[must_use]
    pub fn compute_distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.distance.distance(a, b)
    }

    fn top_layer(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }
}
