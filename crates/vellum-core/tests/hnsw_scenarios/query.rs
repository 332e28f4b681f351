//! Query behavior: ordering, thresholds, beam width and error cases.

use super::helpers::{build_index, generate_embedding, seeded_index, DIM};
use vellum_core::{Error, QueryOptions, SearchQuality};

#[test]
fn test_inserted_vector_is_its_own_nearest_neighbor() {
    let (index, keys, vectors) = build_index(20_240_101, 100);
    let options = QueryOptions::new(1).with_ef_search(200);

    for (key, vector) in keys.iter().zip(&vectors) {
        let hits = index.query_with(vector, &options).unwrap();
        assert_eq!(&hits[0].key, key);
        assert!(hits[0].distance.abs() < 1e-5, "self distance {}", hits[0].distance);
    }
}

#[test]
fn test_results_are_ascending_and_bounded_by_k() {
    let (index, _, _) = build_index(10, 80);
    let hits = index.query(&generate_embedding(5_000, DIM), 15).unwrap();

    assert_eq!(hits.len(), 15);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_k_larger_than_index_returns_everything() {
    let (index, keys, _) = build_index(10, 7);
    let hits = index.query(&generate_embedding(5_000, DIM), 50).unwrap();

    let mut found: Vec<String> = hits.into_iter().map(|h| h.key).collect();
    let mut expected = keys;
    found.sort();
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn test_max_distance_filters_without_reordering() {
    let (index, _, _) = build_index(10, 80);
    let query = generate_embedding(4_242, DIM);

    let all = index.query(&query, 20).unwrap();
    let threshold = all[9].distance;
    let filtered = index
        .query_with(&query, &QueryOptions::new(20).with_max_distance(threshold))
        .unwrap();

    let expected: Vec<_> = all.into_iter().filter(|h| h.distance <= threshold).collect();
    assert_eq!(filtered, expected);
    assert!(filtered.len() >= 10);
}

#[test]
fn test_max_distance_below_every_hit_returns_nothing() {
    let (index, _, _) = build_index(10, 20);
    let hits = index
        .query_with(&generate_embedding(4_242, DIM), &QueryOptions::new(5).with_max_distance(-1.0))
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn test_wider_beam_never_hurts_the_best_hit() {
    let (index, _, _) = build_index(3, 150);
    let query = generate_embedding(9_001, DIM);

    let narrow = index
        .query_with(&query, &QueryOptions::new(5).with_quality(SearchQuality::Fast))
        .unwrap();
    let wide = index
        .query_with(&query, &QueryOptions::new(5).with_ef_search(500))
        .unwrap();
    assert!(wide[0].distance <= narrow[0].distance);
}

#[test]
fn test_query_on_empty_index_fails() {
    let index = seeded_index(1);
    assert!(matches!(index.query(&[1.0, 0.0], 3), Err(Error::EmptyIndex)));
}

#[test]
fn test_query_with_wrong_dimension_fails() {
    let (index, _, _) = build_index(1, 5);
    assert!(matches!(
        index.query(&[1.0, 0.0], 3),
        Err(Error::DimensionMismatch { expected: DIM, actual: 2 })
    ));
}

#[test]
fn test_zero_k_returns_empty() {
    let (index, _, _) = build_index(1, 5);
    assert!(index.query(&generate_embedding(1, DIM), 0).unwrap().is_empty());
}
