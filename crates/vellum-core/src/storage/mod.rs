//! Vector storage backends.
//!
//! - [`MemoryVectorStore`]: resident hash map, the default
//! - [`LogVectorStore`]: durable append-only log with CRC-checked entries

mod log_vectors;
mod memory;
mod traits;


pub use log_vectors::{LogVectorStore, LOG_FILE_NAME};
pub use memory::MemoryVectorStore;
pub use traits::VectorStore;
