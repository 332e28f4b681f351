//! HnswIndex constructors and initialization methods.

use super::HnswIndex;
use crate::error::Result;
use crate::index::hnsw::mappings::KeyMap;
use crate::index::hnsw::native::{DistanceFunction, NativeHnsw};
use crate::index::hnsw::params::HnswParams;
use crate::storage::{MemoryVectorStore, VectorStore};

impl HnswIndex<MemoryVectorStore> {
    /// Creates an empty in-memory index.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vellum_core::{DistanceMetric, HnswIndex, HnswParams};
    ///
    /// let index = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default())?;
    /// assert!(index.is_empty());
    /// # Ok::<(), vellum_core::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `params` fail validation.
    pub fn new(distance: impl Into<DistanceFunction>, params: HnswParams) -> Result<Self> {
        Self::with_store(distance, params, MemoryVectorStore::new())
    }
}

impl<S: VectorStore> HnswIndex<S> {
    /// Creates an empty index whose vectors live in `store`.
    ///
    /// Vectors already in `store` are not indexed; use
    /// [`Self::bulk_insert`] for that, or load a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `params` fail validation.
    pub fn with_store(
        distance: impl Into<DistanceFunction>,
        params: HnswParams,
        store: S,
    ) -> Result<Self> {
        params.validate()?;
        let seed = resolve_seed(params.seed);
        let params = params.with_seed(seed);

        Ok(Self {
            graph: NativeHnsw::new(distance.into(), params, seed),
            keys: KeyMap::default(),
            store,
            dimension: None,
        })
    }
}

/// Picks a random seed when none is configured.
fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| u64::from(rand::random::<u32>()))
}
