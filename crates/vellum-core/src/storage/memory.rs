//! Resident vector store.

use super::traits::VectorStore;
use rustc_hash::FxHashMap;
use std::io;

/// Vectors held in a hash map; the default store of an index.
#[derive(Debug, Clone, Default)]
pub struct MemoryVectorStore {
    vectors: FxHashMap<String, Vec<f32>>,
}

impl MemoryVectorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryVectorStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<f32>>> {
        Ok(self.vectors.get(key).cloned())
    }

    fn put(&mut self, key: &str, vector: &[f32]) -> io::Result<()> {
        self.vectors.insert(key.to_string(), vector.to_vec());
        Ok(())
    }

    fn bulk_put(&mut self, entries: &[(&str, &[f32])]) -> io::Result<()> {
        self.vectors.reserve(entries.len());
        for (key, vector) in entries {
            self.vectors.insert((*key).to_string(), vector.to_vec());
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.vectors.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}
