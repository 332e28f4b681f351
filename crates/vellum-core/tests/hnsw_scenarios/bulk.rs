//! Bulk loading, with and without graph construction.

use super::helpers::{build_index, dataset, seeded_index, DIM};
use vellum_core::{DistanceMetric, Error, HnswIndex, HnswParams, VectorStore};

#[test]
fn test_bulk_insert_matches_sequential_inserts() {
    let (sequential, keys, vectors) = build_index(10, 40);

    let mut bulk = seeded_index(10);
    assert_eq!(bulk.bulk_insert(&keys, &vectors).unwrap(), 40);

    assert_eq!(bulk.export_index(), sequential.export_index());
    assert_eq!(bulk.store().len(), 40);
}

#[test]
fn test_bulk_insert_rejects_in_batch_duplicates_atomically() {
    let (mut keys, vectors) = dataset(5);
    keys[4] = keys[1].clone();

    let mut index = seeded_index(10);
    let err = index.bulk_insert(&keys, &vectors).unwrap_err();

    assert!(matches!(err, Error::DuplicateKey(_)));
    assert!(index.is_empty());
    assert!(index.store().is_empty());
}

#[test]
fn test_bulk_insert_rejects_bad_dimension_atomically() {
    let (keys, mut vectors) = dataset(5);
    vectors[3].pop();

    let mut index = seeded_index(10);
    let err = index.bulk_insert(&keys, &vectors).unwrap_err();

    assert!(matches!(err, Error::DimensionMismatch { expected: DIM, .. }));
    assert!(index.is_empty());
}

#[test]
fn test_bulk_insert_length_mismatch() {
    let (keys, vectors) = dataset(5);
    let mut index = seeded_index(10);
    assert!(matches!(
        index.bulk_insert(&keys, &vectors[..4]),
        Err(Error::LengthMismatch { keys: 5, vectors: 4 })
    ));
}

#[test]
fn test_skip_index_backs_vectors_into_loaded_graph() {
    let (source, keys, vectors) = build_index(10, 30);
    let snapshot = source.export_index();

    let mut restored = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default()).unwrap();
    restored.load_index(&snapshot).unwrap();
    assert_eq!(restored.bulk_insert_skip_index(&keys, &vectors).unwrap(), 30);

    assert_eq!(restored.len(), 30);
    assert_eq!(restored.export_index(), snapshot);
    for (key, vector) in keys.iter().zip(&vectors) {
        assert_eq!(restored.get_vector(key).unwrap().as_ref(), Some(vector));
    }
}

#[test]
fn test_skip_index_rejects_unknown_key() {
    let (source, keys, vectors) = build_index(10, 5);
    let mut restored = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default()).unwrap();
    restored.load_index(&source.export_index()).unwrap();

    let mut bad_keys = keys.clone();
    bad_keys[2] = "not-in-graph".to_string();
    let err = restored.bulk_insert_skip_index(&bad_keys, &vectors).unwrap_err();

    assert!(matches!(err, Error::UnknownKey(k) if k == "not-in-graph"));
    assert!(restored.store().is_empty());
}

#[test]
fn test_skip_index_rejects_already_backed_node() {
    let (mut index, keys, vectors) = build_index(10, 5);
    let err = index
        .bulk_insert_skip_index(&keys[..1], &vectors[..1])
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey(k) if k == keys[0]));
}
