//! Native HNSW graph implementation.
//!
//! The graph works on dense [`NodeId`]s and reads vectors through a
//! [`VectorSource`]; key interning and vector storage live in
//! [`HnswIndex`](crate::index::hnsw::HnswIndex).

pub mod distance;
pub mod graph;
pub mod layer;
pub(crate) mod ordered_float;


pub use distance::{CustomDistanceFn, DistanceEngine, DistanceFunction};
pub use graph::{NativeHnsw, VectorSource};
pub use layer::{Layer, Neighbor, NeighborList, NodeId};
