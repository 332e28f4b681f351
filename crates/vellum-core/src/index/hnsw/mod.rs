//! HNSW (Hierarchical Navigable Small World) index.
//!
//! # Module Organization
//!
//! - `native`: graph algorithms over dense node ids
//! - `index`: [`HnswIndex`], the string-keyed, store-backed public surface
//! - `level`: seeded layer assignment
//! - `params`: construction parameters and query quality profiles
//! - `persistence`: snapshot format and file codec

mod index;
pub mod level;
mod mappings;
pub mod native;
pub mod params;
pub mod persistence;

pub use index::{HnswIndex, QueryOptions, SearchResult};
pub use native::{DistanceEngine, DistanceFunction};
pub use level::{LevelGenerator, MAX_LEVEL};
pub use params::{HnswParams, SearchQuality};
pub use persistence::{load_snapshot, save_snapshot, IndexSnapshot, SnapshotConfig, SnapshotFormat};
