//! Shared helpers for the HNSW scenario tests.

use vellum_core::{DistanceMetric, HnswIndex, HnswParams};

/// Dimension of generated embeddings.
pub const DIM: usize = 64;

/// Generates a deterministic unit-length embedding from a seed.
///
/// Different seeds yield different directions; same seed always yields same vector.
#[allow(clippy::cast_precision_loss)] // Reason: seed/dim values are small test constants
pub fn generate_embedding(seed: u64, dim: usize) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim)
        .map(|i| (seed as f32 * 1.618_034 + i as f32 * 0.577_215_7).sin())
        .collect();

    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Report-number style keys, unique and not in numeric order.
pub fn report_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| (181_003 + (i * 7_919) % 10_007).to_string()).collect()
}

/// `n` keys with their embeddings.
pub fn dataset(n: usize) -> (Vec<String>, Vec<Vec<f32>>) {
    let keys = report_keys(n);
    let vectors = (0..n as u64).map(|i| generate_embedding(i + 1, DIM)).collect();
    (keys, vectors)
}

/// Cosine index with default parameters and a fixed seed.
pub fn seeded_index(seed: u64) -> HnswIndex {
    HnswIndex::new(DistanceMetric::Cosine, HnswParams::default().with_seed(seed))
        .expect("default params are valid")
}

/// Seeded index with the first `n` items of [`dataset`] inserted one by one.
pub fn build_index(seed: u64, n: usize) -> (HnswIndex, Vec<String>, Vec<Vec<f32>>) {
    let (keys, vectors) = dataset(n);
    let mut index = seeded_index(seed);
    for (key, vector) in keys.iter().zip(&vectors) {
        index.insert(key, vector).expect("insert failed");
    }
    (index, keys, vectors)
}
