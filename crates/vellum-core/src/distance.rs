//! Built-in distance metrics.
//!
//! Lower distance means more similar; every ranking in the index is an
//! ascending-distance ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity(a, b)`, valid for vectors of any magnitude.
    #[default]
    Cosine,
    /// `1 - dot(a, b)`; inputs are assumed to be unit length already.
    ///
    /// Non-normalized inputs silently produce wrong distances.
    CosineNormalized,
}

impl DistanceMetric {
    /// Stable identifier stored in snapshots.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::CosineNormalized => "cosine-normalized",
        }
    }

    /// Computes the distance between `a` and `b` with this metric.
    ///
    /// # Panics
    ///
    /// Panics if `a` and `b` have different lengths.
    #[inline]
    #[must_use]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::CosineNormalized => cosine_normalized_distance(a, b),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "cosine-normalized" | "cosine_normalized" => Ok(Self::CosineNormalized),
            other => Err(format!("unknown distance function: {other}")),
        }
    }
}

/// Cosine distance `1 - cos(a, b)`.
///
/// A zero-norm input has no direction; its distance to anything is 1.0.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
#[inline]
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        1.0
    } else {
        1.0 - (dot / denom)
    }
}

/// Cosine distance for pre-normalized vectors: `1 - dot(a, b)`.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
#[inline]
#[must_use]
pub fn cosine_normalized_distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");
    1.0 - a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>()
}

/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
