//! Single inserts and the bulk loader.

use super::HnswIndex;
use crate::error::{Error, Result};
use crate::index::hnsw::level::MAX_LEVEL;
use crate::storage::VectorStore;
use rustc_hash::FxHashSet;

impl<S: VectorStore> HnswIndex<S> {
    /// Inserts `vector` under `key`.
    ///
    /// The vector is written to the store before the graph is touched; if
    /// the write or any later read fails, the graph is left unmodified.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateKey` if `key` is already indexed
    /// - `Error::DimensionMismatch` if the length disagrees with earlier vectors
    /// - `Error::BackingStore` if the store fails
    pub fn insert(&mut self, key: &str, vector: &[f32]) -> Result<()> {
        self.insert_node(key, vector, None, true)
    }

    /// Inserts `vector` under `key` at a caller-chosen level (capped at
    /// [`MAX_LEVEL`]).
    ///
    /// A generator draw is still consumed, so later inserts see the same
    /// levels as if this one had drawn its own.
    ///
    /// # Errors
    ///
    /// Same as [`Self::insert`].
    pub fn insert_with_level(&mut self, key: &str, vector: &[f32], level: usize) -> Result<()> {
        self.insert_node(key, vector, Some(level.min(MAX_LEVEL)), true)
    }

    fn insert_node(
        &mut self,
        key: &str,
        vector: &[f32],
        level: Option<usize>,
        write_vector: bool,
    ) -> Result<()> {
        self.check_dimension(vector)?;
        if self.keys.contains(key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        if write_vector {
            self.store.put(key, vector).map_err(Error::BackingStore)?;
        }

        let node = self.keys.next_id();
        let plan = self.graph.plan_insert(&self.source(), node, vector, level)?;

        self.keys.push(key);
        self.graph.commit_insert(plan);
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }
        Ok(())
    }

    /// Inserts a batch, writing all vectors with one store round-trip.
    ///
    /// The whole batch is validated before anything is written. A failed
    /// store write admits nothing. If a graph insert fails afterwards, the
    /// items before it stay admitted and the error is returned.
    ///
    /// Returns the number of items admitted.
    ///
    /// # Errors
    ///
    /// - `Error::LengthMismatch` if `keys` and `vectors` differ in length
    /// - `Error::DuplicateKey` for a key already indexed or repeated in the batch
    /// - `Error::DimensionMismatch` for a vector of the wrong length
    /// - `Error::BackingStore` if the store fails
    pub fn bulk_insert<K, V>(&mut self, keys: &[K], vectors: &[V]) -> Result<usize>
    where
        K: AsRef<str>,
        V: AsRef<[f32]>,
    {
        self.validate_batch(keys, vectors, |index, key| {
            if index.keys.contains(key) {
                Err(Error::DuplicateKey(key.to_string()))
            } else {
                Ok(())
            }
        })?;
        self.put_batch(keys, vectors)?;

        for (key, vector) in keys.iter().zip(vectors) {
            self.insert_node(key.as_ref(), vector.as_ref(), None, false)?;
        }
        tracing::debug!(batch = keys.len(), nodes = self.len(), "Bulk insert complete");
        Ok(keys.len())
    }

    /// Backs vectors into the store for nodes of an already-loaded graph,
    /// without any search or insert work.
    ///
    /// Every key must be a node of the loaded graph; a vector stored for any
    /// other key could never be reached by a search, so such batches are
    /// rejected as a whole.
    ///
    /// Returns the number of vectors stored.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownKey` for a key that is not a graph node
    /// - `Error::DuplicateKey` for a node that already has a vector, or a key
    ///   repeated in the batch
    /// - `Error::LengthMismatch`, `Error::DimensionMismatch`, `Error::BackingStore`
    pub fn bulk_insert_skip_index<K, V>(&mut self, keys: &[K], vectors: &[V]) -> Result<usize>
    where
        K: AsRef<str>,
        V: AsRef<[f32]>,
    {
        self.validate_batch(keys, vectors, |index, key| {
            if index.keys.contains(key) {
                Ok(())
            } else {
                Err(Error::UnknownKey(key.to_string()))
            }
        })?;

        let batch: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        let stored = self.store.bulk_get(&batch).map_err(Error::BackingStore)?;
        if let Some((key, _)) = batch.iter().zip(&stored).find(|(_, v)| v.is_some()) {
            return Err(Error::DuplicateKey((*key).to_string()));
        }
        self.put_batch(keys, vectors)?;

        if self.dimension.is_none() {
            self.dimension = vectors.first().map(|v| v.as_ref().len());
        }
        tracing::debug!(batch = keys.len(), "Vectors backed into loaded graph");
        Ok(keys.len())
    }

    /// Checks lengths, dimensions, in-batch duplicates and `check_key` for
    /// every item before anything is written.
    fn validate_batch<K, V, F>(&self, keys: &[K], vectors: &[V], check_key: F) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<[f32]>,
        F: Fn(&Self, &str) -> Result<()>,
    {
        if keys.len() != vectors.len() {
            return Err(Error::LengthMismatch {
                keys: keys.len(),
                vectors: vectors.len(),
            });
        }

        let expected = self
            .dimension
            .or_else(|| vectors.first().map(|v| v.as_ref().len()));
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        for (key, vector) in keys.iter().zip(vectors) {
            let key = key.as_ref();
            let vector = vector.as_ref();
            if let Some(expected) = expected {
                if vector.len() != expected {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
            }
            if !seen.insert(key) {
                return Err(Error::DuplicateKey(key.to_string()));
            }
            check_key(self, key)?;
        }
        Ok(())
    }

    fn put_batch<K, V>(&mut self, keys: &[K], vectors: &[V]) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<[f32]>,
    {
        let entries: Vec<(&str, &[f32])> = keys
            .iter()
            .zip(vectors)
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();
        self.store.bulk_put(&entries).map_err(Error::BackingStore)
    }
}
