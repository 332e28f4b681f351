//! Fuzz target for the distance metrics and graph construction.
//!
//! Looks for panics on NaN, Inf and extreme magnitudes, both in the raw
//! metrics and when such vectors drive inserts and queries.
//!
//! # Running
//!
//! ```bash
//! cd fuzz
//! cargo +nightly fuzz run fuzz_distance_metrics
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vellum_core::distance::{cosine_distance, cosine_normalized_distance};
use vellum_core::{DistanceMetric, HnswIndex, HnswParams};

#[derive(Arbitrary, Debug)]
struct DistanceInput {
    /// First vector; fixes the dimension.
    vec_a: Vec<f32>,
    /// Second vector, truncated or padded to the dimension of `vec_a`.
    vec_b: Vec<f32>,
    /// Extra vectors inserted into a small index.
    points: Vec<Vec<f32>>,
    seed: u32,
}

fuzz_target!(|input: DistanceInput| {
    if input.vec_a.is_empty() {
        return;
    }

    // Limit vector size to prevent OOM
    let dim = input.vec_a.len().min(256);
    let a: Vec<f32> = input.vec_a.into_iter().take(dim).collect();
    let mut b: Vec<f32> = input.vec_b.into_iter().take(dim).collect();
    b.resize(dim, 0.0);

    let _ = cosine_distance(&a, &b);
    let _ = cosine_normalized_distance(&a, &b);

    let params = HnswParams::new(4, 16).with_seed(u64::from(input.seed));
    let Ok(mut index) = HnswIndex::new(DistanceMetric::Cosine, params) else {
        return;
    };
    for (i, mut point) in input.points.into_iter().take(64).enumerate() {
        point.resize(dim, 0.0);
        let _ = index.insert(&i.to_string(), &point);
    }
    let _ = index.query(&a, 5);
});
