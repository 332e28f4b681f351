//! Storage traits for vectors.

use std::io;

/// Key-value storage for raw vectors, keyed by node key.
///
/// The index reads vectors through this trait during every distance
/// computation against an existing node, so `get` sits on the hot path.
pub trait VectorStore: Send + Sync {
    /// Returns the vector stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> io::Result<Option<Vec<f32>>>;

    /// Stores `vector` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is stored in that case.
    fn put(&mut self, key: &str, vector: &[f32]) -> io::Result<()>;

    /// Stores a batch of vectors with a single round-trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn bulk_put(&mut self, entries: &[(&str, &[f32])]) -> io::Result<()> {
        for (key, vector) in entries {
            self.put(key, vector)?;
        }
        Ok(())
    }

    /// Fetches several vectors; missing keys yield `None` in place.
    ///
    /// # Errors
    ///
    /// Returns an error if any read fails.
    fn bulk_get(&self, keys: &[&str]) -> io::Result<Vec<Option<Vec<f32>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Removes every stored vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be reset.
    fn clear(&mut self) -> io::Result<()>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: VectorStore + ?Sized> VectorStore for Box<S> {
    fn get(&self, key: &str) -> io::Result<Option<Vec<f32>>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, vector: &[f32]) -> io::Result<()> {
        (**self).put(key, vector)
    }

    fn bulk_put(&mut self, entries: &[(&str, &[f32])]) -> io::Result<()> {
        (**self).bulk_put(entries)
    }

    fn bulk_get(&self, keys: &[&str]) -> io::Result<Vec<Option<Vec<f32>>>> {
        (**self).bulk_get(keys)
    }

    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
