//! Distance computation engines for native HNSW.
//!
//! Search and insert only ever see the [`DistanceEngine`] capability, so a
//! built-in metric and a caller-supplied closure are interchangeable.

use crate::distance::DistanceMetric;
use std::fmt;
use std::sync::Arc;

/// Trait for distance computation engines.
pub trait DistanceEngine: Send + Sync {
    /// Computes distance between two vectors.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;

    /// Identifier recorded in snapshots; loading checks it for equality.
    fn id(&self) -> &str;
}

/// Signature of a caller-supplied metric.
pub type CustomDistanceFn = dyn Fn(&[f32], &[f32]) -> f32 + Send + Sync;

/// The distance function an index is built with.
#[derive(Clone)]
pub enum DistanceFunction {
    /// One of the built-in metrics.
    Builtin(DistanceMetric),
    /// A caller-supplied metric. It must be commutative and defined for
    /// equal-length inputs; the index treats it exactly like a built-in.
    Custom {
        /// Identifier stored in snapshots.
        id: String,
        /// The metric itself.
        func: Arc<CustomDistanceFn>,
    },
}

impl DistanceFunction {
    /// Wraps a closure as a custom metric.
    pub fn custom<F>(id: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f32], &[f32]) -> f32 + Send + Sync + 'static,
    {
        Self::Custom {
            id: id.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the built-in metric, if this is one.
    #[must_use]
    pub fn metric(&self) -> Option<DistanceMetric> {
        match self {
            Self::Builtin(metric) => Some(*metric),
            Self::Custom { .. } => None,
        }
    }
}

impl Default for DistanceFunction {
    fn default() -> Self {
        Self::Builtin(DistanceMetric::default())
    }
}

impl From<DistanceMetric> for DistanceFunction {
    fn from(metric: DistanceMetric) -> Self {
        Self::Builtin(metric)
    }
}

impl fmt::Debug for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(metric) => f.debug_tuple("Builtin").field(metric).finish(),
            Self::Custom { id, .. } => f.debug_struct("Custom").field("id", id).finish_non_exhaustive(),
        }
    }
}

impl DistanceEngine for DistanceFunction {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Builtin(metric) => metric.distance(a, b),
            Self::Custom { func, .. } => func(a, b),
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::Builtin(metric) => metric.id(),
            Self::Custom { id, .. } => id,
        }
    }
}

impl DistanceEngine for DistanceMetric {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        DistanceMetric::distance(self, a, b)
    }

    fn id(&self) -> &str {
        DistanceMetric::id(self)
    }
}
