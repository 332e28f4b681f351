//! Query operations.

use super::HnswIndex;
use crate::error::{Error, Result};
use crate::index::hnsw::params::SearchQuality;
use crate::storage::VectorStore;
use serde::{Deserialize, Serialize};

/// Default number of results.
pub const DEFAULT_TOP_K: usize = 10;

/// One query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Key of the matching node.
    pub key: String,
    /// Distance between the query and the node.
    pub distance: f32,
}

/// Query parameters.
///
/// The beam width is, in order of precedence: `ef_search`, the width of
/// `quality`, the index default. It never drops below `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// Number of results.
    pub k: usize,
    /// Explicit beam width.
    pub ef_search: Option<usize>,
    /// Quality profile used when no explicit width is given.
    pub quality: Option<SearchQuality>,
    /// Drops results farther than this after ranking. It never changes
    /// which nodes the search visits.
    pub max_distance: Option<f32>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl QueryOptions {
    /// Options returning the `k` closest nodes.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self {
            k,
            ef_search: None,
            quality: None,
            max_distance: None,
        }
    }

    /// Sets an explicit beam width.
    #[must_use]
    pub const fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = Some(ef_search);
        self
    }

    /// Sets a quality profile.
    #[must_use]
    pub const fn with_quality(mut self, quality: SearchQuality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Sets the distance threshold.
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }
}

impl<S: VectorStore> HnswIndex<S> {
    /// Returns the `k` nodes closest to `vector`, ascending by distance.
    ///
    /// # Errors
    ///
    /// Same as [`Self::query_with`].
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.query_with(vector, &QueryOptions::new(k))
    }

    /// Runs a query with explicit options.
    ///
    /// Results are ascending by distance; equal distances keep insertion order.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyIndex` before the first insert
    /// - `Error::DimensionMismatch` if the query length is wrong
    /// - `Error::BackingStore` / `Error::MissingVector` if a vector cannot be read
    pub fn query_with(&self, vector: &[f32], options: &QueryOptions) -> Result<Vec<SearchResult>> {
        if self.is_empty() {
            return Err(Error::EmptyIndex);
        }
        self.check_dimension(vector)?;
        if options.k == 0 {
            return Ok(Vec::new());
        }

        let k = options.k;
        let ef = options
            .ef_search
            .or_else(|| options.quality.map(|q| q.ef_search(k)))
            .unwrap_or(self.graph.params().ef_search);

        let hits = self.graph.search(&self.source(), vector, k, ef)?;

        Ok(hits
            .into_iter()
            .filter(|hit| options.max_distance.is_none_or(|max| hit.distance <= max))
            .filter_map(|hit| {
                self.keys.key(hit.id).map(|key| SearchResult {
                    key: key.to_string(),
                    distance: hit.distance,
                })
            })
            .collect())
    }
}
