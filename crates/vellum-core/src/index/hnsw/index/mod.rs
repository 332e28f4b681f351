//! `HnswIndex`: string-keyed HNSW index over a pluggable vector store.
//!
//! # Module Organization
//!
//! - `constructors`: creation and parameter resolution
//! - `insert`: single inserts and the bulk loader
//! - `search`: queries and result filtering
//! - `snapshot`: export and wholesale load of the graph

mod constructors;
mod insert;
mod search;
mod snapshot;

pub use search::{QueryOptions, SearchResult};

use super::mappings::KeyMap;
use super::native::{DistanceEngine, DistanceFunction, NativeHnsw, NodeId, VectorSource};
use super::params::HnswParams;
use crate::error::{Error, Result};
use crate::storage::{MemoryVectorStore, VectorStore};

/// HNSW index keyed by caller-supplied strings.
///
/// Mutation takes `&mut self` and queries take `&self`, so one writer at a
/// time is enforced by the borrow checker; share it across threads behind a
/// lock or through [`IndexWorker`](crate::worker::IndexWorker).
///
/// # Example
///
/// ```rust
/// use vellum_core::{DistanceMetric, HnswIndex, HnswParams};
///
/// let mut index = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default().with_seed(42))?;
/// index.insert("a", &[1.0, 0.0])?;
/// index.insert("b", &[0.0, 1.0])?;
///
/// let hits = index.query(&[0.9, 0.1], 1)?;
/// assert_eq!(hits[0].key, "a");
/// # Ok::<(), vellum_core::Error>(())
/// ```
pub struct HnswIndex<S: VectorStore = MemoryVectorStore> {
    graph: NativeHnsw<DistanceFunction>,
    keys: KeyMap,
    store: S,
    dimension: Option<usize>,
}

/// Resolves node ids to vectors through the key map and the store.
struct StoreSource<'a, S: VectorStore> {
    keys: &'a KeyMap,
    store: &'a S,
}

impl<S: VectorStore> VectorSource for StoreSource<'_, S> {
    fn vector(&self, node: NodeId) -> Result<Vec<f32>> {
        let key = self
            .keys
            .key(node)
            .ok_or_else(|| Error::MissingVector(format!("#{node}")))?;
        self.store
            .get(key)
            .map_err(Error::BackingStore)?
            .ok_or_else(|| Error::MissingVector(key.to_string()))
    }
}

impl<S: VectorStore> HnswIndex<S> {
    fn source(&self) -> StoreSource<'_, S> {
        StoreSource {
            keys: &self.keys,
            store: &self.store,
        }
    }

    /// Fails if `vector` disagrees with the established dimension.
    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Returns true if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Returns true if `key` is a node of the graph.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Vector dimension, established by the first insert.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of layers in the graph.
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.graph.num_layers()
    }

    /// Key of the current entry point.
    #[must_use]
    pub fn entry_point(&self) -> Option<&str> {
        self.graph.entry_point().and_then(|id| self.keys.key(id))
    }

    /// Keys of the nodes in `layer`, in insertion order.
    #[must_use]
    pub fn layer_keys(&self, layer: usize) -> Vec<String> {
        self.graph.layer(layer).map_or_else(Vec::new, |l| {
            l.node_ids()
                .into_iter()
                .filter_map(|id| self.keys.key(id).map(str::to_string))
                .collect()
        })
    }

    /// Neighbors of `key` in `layer` with their cached distances, or `None`
    /// if the node is not a member of that layer.
    #[must_use]
    pub fn neighbors(&self, key: &str, layer: usize) -> Option<Vec<(String, f32)>> {
        let id = self.keys.id(key)?;
        let layer = self.graph.layer(layer).filter(|l| l.contains(id))?;
        Some(
            layer
                .neighbors(id)
                .iter()
                .filter_map(|n| self.keys.key(n.id).map(|k| (k.to_string(), n.distance)))
                .collect(),
        )
    }

    /// Construction parameters, with the resolved seed.
    #[must_use]
    pub fn params(&self) -> HnswParams {
        self.graph.params().with_seed(self.graph.seed())
    }

    /// Identifier of the distance function.
    #[must_use]
    pub fn distance_id(&self) -> &str {
        self.graph.distance_engine().id()
    }

    /// Computes the distance between two vectors with this index's function.
    #[must_use]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.graph.compute_distance(a, b)
    }

    /// The backing vector store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the stored vector of `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::BackingStore` if the store read fails.
    pub fn get_vector(&self, key: &str) -> Result<Option<Vec<f32>>> {
        self.store.get(key).map_err(Error::BackingStore)
    }

    /// Consumes the index, returning its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: VectorStore> std::fmt::Debug for HnswIndex<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("len", &self.len())
            .field("layers", &self.num_layers())
            .field("dimension", &self.dimension)
            .field("distance", &self.distance_id())
            .finish_non_exhaustive()
    }
}
