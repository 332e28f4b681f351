//! # Vellum Core
//!
//! Incremental approximate nearest-neighbor index for embedding retrieval.
//!
//! Vellum builds a Hierarchical Navigable Small World (HNSW) graph one
//! insert at a time and can be queried at any point. Graph construction is
//! deterministic for a fixed seed and insertion order, so graph shape can be
//! regression-tested exactly.
//!
//! ## Features
//!
//! - **Incremental HNSW**: insert-as-you-go with a seeded level generator
//! - **Pluggable distance**: cosine, pre-normalized cosine, or any closure
//! - **Bulk loading**: batched store writes, and a skip-index path that backs
//!   vectors into a pre-built graph
//! - **Snapshots**: export/load the whole graph as JSON or binary
//! - **Durable vectors**: optional append-only log store keeps vectors off-heap
//!
//! ## Quick Start
//!
//! ```rust
//! use vellum_core::{DistanceMetric, HnswIndex, HnswParams, QueryOptions};
//!
//! let params = HnswParams::default().with_seed(20_240_101);
//! let mut index = HnswIndex::new(DistanceMetric::Cosine, params)?;
//!
//! index.bulk_insert(
//!     &["0", "1", "2"],
//!     &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.7, 0.7, 0.0]],
//! )?;
//!
//! let hits = index.query_with(&[0.9, 0.1, 0.0], &QueryOptions::new(2).with_max_distance(0.5))?;
//! assert_eq!(hits[0].key, "0");
//!
//! // Export, then rebuild elsewhere without re-inserting.
//! let snapshot = index.export_index();
//! let mut restored = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default())?;
//! restored.load_index(&snapshot)?;
//! restored.bulk_insert_skip_index(
//!     &["0", "1", "2"],
//!     &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.7, 0.7, 0.0]],
//! )?;
//! assert_eq!(restored.query(&[0.9, 0.1, 0.0], 2)?, index.query(&[0.9, 0.1, 0.0], 2)?);
//! # Ok::<(), vellum_core::Error>(())
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_lossless,
        clippy::float_cmp
    )
)]

pub mod config;
pub mod distance;
#[cfg(test)]
mod distance_tests;
pub mod error;
pub mod index;
pub mod storage;
pub mod worker;

pub use config::{
    ConfigError, HnswConfig, LoggingConfig, SearchConfig, StorageBackend, StorageConfig,
    VellumConfig,
};
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use index::hnsw::{
    load_snapshot, save_snapshot, DistanceEngine, DistanceFunction, HnswIndex, HnswParams,
    IndexSnapshot, QueryOptions, SearchQuality, SearchResult, SnapshotConfig, SnapshotFormat,
};
pub use storage::{LogVectorStore, MemoryVectorStore, VectorStore};
pub use worker::{IndexWorker, WorkerHandle};
