//! HNSW index parameters and search quality profiles.
//!
//! This module contains configuration types for tuning HNSW index
//! construction and query-time recall.

use serde::{Deserialize, Serialize};

/// Default neighbors per node on layers above 0 (M).
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;
/// Default construction beam width.
pub const DEFAULT_EF_CONSTRUCTION: usize = 100;
/// Default query beam width.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// HNSW index parameters for tuning construction and recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Maximum neighbors per node on layers >= 1 (M parameter).
    /// Higher = better recall, more memory, slower insert.
    pub max_connections: usize,
    /// Maximum neighbors per node on layer 0 (Mmax0, conventionally `2 * M`).
    pub max_connections_0: usize,
    /// Beam width during construction.
    /// Higher = better recall, slower indexing.
    pub ef_construction: usize,
    /// Default beam width during queries.
    pub ef_search: usize,
    /// Seed of the level generator. `None` picks a random seed at creation,
    /// which is then recorded in exported snapshots.
    pub seed: Option<u64>,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONNECTIONS, DEFAULT_EF_CONSTRUCTION)
    }
}

impl HnswParams {
    /// Creates parameters with `Mmax0 = 2 * M` and the default query ef.
    #[must_use]
    pub const fn new(max_connections: usize, ef_construction: usize) -> Self {
        Self {
            max_connections,
            max_connections_0: max_connections.saturating_mul(2),
            ef_construction,
            ef_search: DEFAULT_EF_SEARCH,
            seed: None,
        }
    }

    /// Fixes the level generator seed, making graph construction reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the default query beam width.
    #[must_use]
    pub const fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = ef_search;
        self
    }

    /// Creates fast parameters optimized for insertion speed.
    #[must_use]
    pub const fn fast() -> Self {
        Self::new(12, 64)
    }

    /// Creates parameters optimized for high recall.
    #[must_use]
    pub const fn high_recall() -> Self {
        Self::new(DEFAULT_MAX_CONNECTIONS + 8, DEFAULT_EF_CONSTRUCTION + 200).with_ef_search(128)
    }

    /// Creates fully custom parameters.
    #[must_use]
    pub const fn custom(
        max_connections: usize,
        max_connections_0: usize,
        ef_construction: usize,
        ef_search: usize,
    ) -> Self {
        Self {
            max_connections,
            max_connections_0,
            ef_construction,
            ef_search,
            seed: None,
        }
    }

    /// Neighbor cap for `layer`.
    #[inline]
    #[must_use]
    pub const fn max_connections_for(&self, layer: usize) -> usize {
        if layer == 0 {
            self.max_connections_0
        } else {
            self.max_connections
        }
    }

    /// Checks the parameters for values the graph cannot be built with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_connections < 2 {
            return Err(crate::Error::Config(format!(
                "max_connections must be >= 2, got {}",
                self.max_connections
            )));
        }
        if self.max_connections_0 < self.max_connections {
            return Err(crate::Error::Config(format!(
                "max_connections_0 ({}) must be >= max_connections ({})",
                self.max_connections_0, self.max_connections
            )));
        }
        if self.ef_construction == 0 {
            return Err(crate::Error::Config(
                "ef_construction must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Search quality profile controlling the recall/latency tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchQuality {
    /// Fast search with `ef_search=32`.
    Fast,
    /// Balanced search with `ef_search=64`.
    #[default]
    Balanced,
    /// Accurate search with `ef_search=128`.
    Accurate,
    /// High recall search with `ef_search=256`.
    HighRecall,
    /// Custom `ef_search` value.
    Custom(usize),
}

impl SearchQuality {
    /// Returns the `ef_search` value for this quality profile; never below `k`.
    #[must_use]
    pub fn ef_search(&self, k: usize) -> usize {
        match self {
            Self::Fast => 32.max(k),
            Self::Balanced => 64.max(k * 2),
            Self::Accurate => 128.max(k * 4),
            Self::HighRecall => 256.max(k * 8),
            Self::Custom(ef) => (*ef).max(k),
        }
    }
}
