//! Incremental insert scenarios with fixed seeds.

use super::helpers::{build_index, dataset, generate_embedding, seeded_index, DIM};
use vellum_core::{DistanceFunction, Error, HnswIndex, HnswParams};

#[test]
fn test_seed_20240101_builds_single_dense_layer() {
    let (index, keys, _) = build_index(20_240_101, 10);

    assert_eq!(index.len(), 10);
    assert_eq!(index.num_layers(), 1);
    assert_eq!(index.entry_point(), Some(keys[0].as_str()));
    for key in &keys {
        let neighbors = index.neighbors(key, 0).expect("node in layer 0");
        assert_eq!(neighbors.len(), 9, "node {key} should link to every other node");
        assert!(neighbors.iter().all(|(n, _)| n != key));
    }
}

#[test]
fn test_seed_10_promotes_fourth_and_fifth_nodes() {
    let (index, keys, _) = build_index(10, 10);

    assert_eq!(index.num_layers(), 2);
    assert_eq!(index.layer_keys(1), vec![keys[3].clone(), keys[4].clone()]);
    assert_eq!(index.entry_point(), Some(keys[3].as_str()));

    let upper_a = index.neighbors(&keys[3], 1).unwrap();
    let upper_b = index.neighbors(&keys[4], 1).unwrap();
    assert_eq!(upper_a.len(), 1);
    assert_eq!(upper_a[0].0, keys[4]);
    assert_eq!(upper_b.len(), 1);
    assert_eq!(upper_b[0].0, keys[3]);

    assert!(index.neighbors(&keys[0], 1).is_none());
    assert_eq!(index.layer_keys(0), keys);
}

#[test]
fn test_cached_distances_match_distance_function() {
    let (index, keys, vectors) = build_index(10, 10);

    for (i, key) in keys.iter().enumerate() {
        for (neighbor, cached) in index.neighbors(key, 0).unwrap() {
            let j = keys.iter().position(|k| *k == neighbor).unwrap();
            let expected = index.distance(&vectors[i], &vectors[j]);
            assert_eq!(cached, expected, "edge {key} -> {neighbor}");
        }
    }
}

#[test]
fn test_same_seed_and_order_build_identical_graphs() {
    let (a, _, _) = build_index(777, 120);
    let (b, _, _) = build_index(777, 120);
    assert_eq!(a.export_index(), b.export_index());
}

#[test]
fn test_explicit_level_builds_upper_layers() {
    let (keys, vectors) = dataset(6);
    let mut index = seeded_index(20_240_101);
    for (key, vector) in keys.iter().zip(&vectors).take(5) {
        index.insert(key, vector).unwrap();
    }
    index.insert_with_level(&keys[5], &vectors[5], 3).unwrap();

    assert_eq!(index.num_layers(), 4);
    assert_eq!(index.entry_point(), Some(keys[5].as_str()));
    for layer in 1..4 {
        assert_eq!(index.layer_keys(layer), vec![keys[5].clone()]);
        assert_eq!(index.neighbors(&keys[5], layer), Some(Vec::new()));
    }
}

#[test]
fn test_explicit_level_still_consumes_a_draw() {
    let (keys, vectors) = dataset(10);

    let drawn = {
        let mut index = seeded_index(10);
        for (key, vector) in keys.iter().zip(&vectors) {
            index.insert(key, vector).unwrap();
        }
        index
    };
    let forced = {
        let mut index = seeded_index(10);
        for (i, (key, vector)) in keys.iter().zip(&vectors).enumerate() {
            if i == 0 {
                index.insert_with_level(key, vector, 0).unwrap();
            } else {
                index.insert(key, vector).unwrap();
            }
        }
        index
    };

    assert_eq!(drawn.export_index(), forced.export_index());
}

#[test]
fn test_duplicate_key_rejected_without_changes() {
    let (mut index, keys, _) = build_index(10, 5);
    let before = index.export_index();

    let err = index.insert(&keys[2], &generate_embedding(99, DIM)).unwrap_err();
    assert!(matches!(err, Error::DuplicateKey(k) if k == keys[2]));
    assert_eq!(index.export_index(), before);
}

#[test]
fn test_dimension_fixed_by_first_insert() {
    let mut index = seeded_index(1);
    index.insert("a", &[1.0, 0.0, 0.0]).unwrap();
    assert_eq!(index.dimension(), Some(3));

    let err = index.insert("b", &[1.0, 0.0]).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    ));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_custom_distance_drives_construction() {
    let manhattan = DistanceFunction::custom("manhattan", |a: &[f32], b: &[f32]| {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    });
    let mut index =
        HnswIndex::new(manhattan, HnswParams::default().with_seed(20_240_101)).unwrap();
    index.insert("origin", &[0.0, 0.0]).unwrap();
    index.insert("east", &[3.0, 0.0]).unwrap();
    index.insert("north", &[0.0, 1.0]).unwrap();

    assert_eq!(index.distance_id(), "manhattan");
    let neighbors = index.neighbors("origin", 0).unwrap();
    assert!(neighbors.contains(&("east".to_string(), 3.0)));
    assert!(neighbors.contains(&("north".to_string(), 1.0)));

    let hits = index.query(&[0.0, 0.9], 1).unwrap();
    assert_eq!(hits[0].key, "north");
}
