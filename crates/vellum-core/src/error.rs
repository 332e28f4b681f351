//! Error types for vellum-core.

use thiserror::Error;

/// Index error types.
///
/// Every error is surfaced synchronously to the immediate caller; nothing in
/// the index retries on its own.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector length disagrees with the index dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the first insert.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// Insert with a key that is already present.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Query issued before any insert.
    #[error("Index is empty")]
    EmptyIndex,

    /// The vector store failed while reading or writing.
    #[error("Backing store error: {0}")]
    BackingStore(#[source] std::io::Error),

    /// A skip-index bulk load referenced a key that is not in the loaded graph.
    ///
    /// Admitting it would store a vector that no search can ever reach.
    #[error("Key not present in loaded graph: {0}")]
    UnknownKey(String),

    /// A graph node has no vector in the store.
    #[error("No vector stored for node: {0}")]
    MissingVector(String),

    /// Bulk call with a different number of keys and vectors.
    #[error("Bulk length mismatch: {keys} keys, {vectors} vectors")]
    LengthMismatch {
        /// Number of keys supplied.
        keys: usize,
        /// Number of vectors supplied.
        vectors: usize,
    },

    /// Snapshot was built with a different distance function.
    #[error("Incompatible snapshot: {0}")]
    IncompatibleSnapshot(String),

    /// Snapshot is structurally inconsistent.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Snapshot encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The index worker thread is no longer running.
    #[error("Index worker stopped")]
    WorkerStopped,

    /// IO error outside the vector store (snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;
