//! Snapshot export, file round trips and reload.

use tempfile::TempDir;

use super::helpers::{build_index, dataset, generate_embedding, DIM};
use vellum_core::{
    load_snapshot, save_snapshot, DistanceFunction, DistanceMetric, Error, HnswIndex, HnswParams,
    IndexSnapshot, LogVectorStore, MemoryVectorStore, QueryOptions, SnapshotFormat,
    VectorStore,
};

fn sample_queries() -> Vec<Vec<f32>> {
    (0..10).map(|i| generate_embedding(10_000 + i, DIM)).collect()
}

#[test]
fn test_file_round_trip_preserves_query_results() {
    let (index, keys, vectors) = build_index(10, 60);
    let snapshot = index.export_index();
    let dir = TempDir::new().unwrap();

    for (name, format) in [
        ("graph.json", SnapshotFormat::Json),
        ("graph.bin", SnapshotFormat::Binary),
    ] {
        let path = dir.path().join(name);
        save_snapshot(&path, &snapshot, format).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, snapshot, "{name} changed the snapshot");

        let mut restored =
            HnswIndex::from_snapshot(DistanceMetric::Cosine, &loaded, MemoryVectorStore::new())
                .unwrap();
        restored.bulk_insert_skip_index(&keys, &vectors).unwrap();

        for query in sample_queries() {
            assert_eq!(
                restored.query(&query, 8).unwrap(),
                index.query(&query, 8).unwrap()
            );
        }
    }
}

#[test]
fn test_loaded_index_resumes_level_sequence() {
    let (keys, vectors) = dataset(25);
    let (direct, _, _) = build_index(10, 25);

    let (partial, _, _) = build_index(10, 20);
    let mut resumed = HnswIndex::new(DistanceMetric::Cosine, HnswParams::fast()).unwrap();
    resumed.load_index(&partial.export_index()).unwrap();
    resumed
        .bulk_insert_skip_index(&keys[..20], &vectors[..20])
        .unwrap();
    for (key, vector) in keys.iter().zip(&vectors).skip(20) {
        resumed.insert(key, vector).unwrap();
    }

    assert_eq!(resumed.params(), direct.params());
    assert_eq!(resumed.export_index(), direct.export_index());
}

#[test]
fn test_export_of_empty_index_reloads() {
    let index = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default().with_seed(5)).unwrap();
    let snapshot = index.export_index();
    assert!(snapshot.layers.is_empty());
    assert_eq!(snapshot.entry_point, None);
    assert_eq!(snapshot.node_count, 0);

    let json = snapshot.to_json().unwrap();
    let restored = HnswIndex::from_snapshot(
        DistanceMetric::Cosine,
        &IndexSnapshot::from_json(&json).unwrap(),
        MemoryVectorStore::new(),
    )
    .unwrap();
    assert!(restored.is_empty());
    assert!(matches!(restored.query(&[1.0], 1), Err(Error::EmptyIndex)));
}

#[test]
fn test_log_store_survives_restart_with_snapshot() {
    let dir = TempDir::new().unwrap();
    let (keys, vectors) = dataset(40);
    let snapshot_path = dir.path().join("graph.bin");
    let query = generate_embedding(31_337, DIM);

    let expected = {
        let store = LogVectorStore::open(dir.path().join("vectors")).unwrap();
        let mut index = HnswIndex::with_store(
            DistanceMetric::Cosine,
            HnswParams::default().with_seed(10),
            store,
        )
        .unwrap();
        index.bulk_insert(&keys, &vectors).unwrap();
        save_snapshot(&snapshot_path, &index.export_index(), SnapshotFormat::Binary).unwrap();
        index.query(&query, 5).unwrap()
    };

    let store = LogVectorStore::open(dir.path().join("vectors")).unwrap();
    let snapshot = load_snapshot(&snapshot_path).unwrap();
    let reopened = HnswIndex::from_snapshot(DistanceMetric::Cosine, &snapshot, store).unwrap();

    assert_eq!(reopened.len(), 40);
    assert_eq!(reopened.query(&query, 5).unwrap(), expected);
}

#[test]
fn test_custom_distance_snapshot_requires_same_id() {
    let l1 = || {
        DistanceFunction::custom("l1", |a: &[f32], b: &[f32]| {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        })
    };
    let mut index = HnswIndex::new(l1(), HnswParams::default().with_seed(10)).unwrap();
    let (keys, vectors) = dataset(12);
    index.bulk_insert(&keys, &vectors).unwrap();
    let snapshot = index.export_index();
    assert_eq!(snapshot.config.distance_function_id, "l1");

    let mut same = HnswIndex::new(l1(), HnswParams::default()).unwrap();
    same.load_index(&snapshot).unwrap();
    same.bulk_insert_skip_index(&keys, &vectors).unwrap();
    let options = QueryOptions::new(3);
    assert_eq!(
        same.query_with(&vectors[7], &options).unwrap(),
        index.query_with(&vectors[7], &options).unwrap()
    );

    let mut cosine = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default()).unwrap();
    assert!(matches!(
        cosine.load_index(&snapshot),
        Err(Error::IncompatibleSnapshot(_))
    ));
}

#[test]
fn test_load_into_populated_index_drops_old_vectors() {
    let keys = ["0", "1"];
    let mut target = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default()).unwrap();
    target
        .bulk_insert(&keys, &[vec![1.0, 0.0], vec![0.0, 1.0]])
        .unwrap();

    let swapped = [vec![0.0, 1.0], vec![1.0, 0.0]];
    let mut source =
        HnswIndex::new(DistanceMetric::Cosine, HnswParams::default().with_seed(3)).unwrap();
    source.bulk_insert(&keys, &swapped).unwrap();

    target.load_index(&source.export_index()).unwrap();
    assert!(target.store().is_empty());
    assert_eq!(target.bulk_insert_skip_index(&keys, &swapped).unwrap(), 2);

    let hits = target.query(&[1.0, 0.0], 1).unwrap();
    assert_eq!(hits[0].key, "1");
    assert_eq!(hits, source.query(&[1.0, 0.0], 1).unwrap());
}

fn valid_snapshot() -> IndexSnapshot {
    let (index, _, _) = build_index(10, 10);
    index.export_index()
}

fn assert_invalid(snapshot: &IndexSnapshot) {
    let mut index = HnswIndex::new(DistanceMetric::Cosine, HnswParams::default()).unwrap();
    index.insert("keep", &[1.0, 0.0]).unwrap();
    let err = index.load_index(snapshot).unwrap_err();
    assert!(matches!(err, Error::InvalidSnapshot(_)), "got {err:?}");
    assert!(index.contains("keep"), "failed load must keep the current graph");
    assert_eq!(index.store().len(), 1, "failed load must keep the stored vectors");
}

#[test]
fn test_node_count_must_match_bottom_layer() {
    let mut snapshot = valid_snapshot();
    snapshot.node_count += 1;
    assert_invalid(&snapshot);
}

#[test]
fn test_upper_layer_node_must_exist_below() {
    let mut snapshot = valid_snapshot();
    snapshot.layers[1].insert("ghost".to_string(), Default::default());
    assert_invalid(&snapshot);
}

#[test]
fn test_neighbor_must_be_in_same_layer() {
    let mut snapshot = valid_snapshot();
    let bottom_key = snapshot.layers[0].keys().next().unwrap().clone();
    let upper_key = snapshot.layers[1].keys().next().unwrap().clone();
    snapshot.layers[1]
        .get_mut(&upper_key)
        .unwrap()
        .insert(bottom_key, 0.5);
    assert_invalid(&snapshot);
}

#[test]
fn test_entry_point_must_be_in_top_layer() {
    let mut snapshot = valid_snapshot();
    snapshot.entry_point = snapshot.layers[0].keys().next().cloned();
    assert_invalid(&snapshot);
}

#[test]
fn test_empty_layer_rejected() {
    let mut snapshot = valid_snapshot();
    snapshot.layers.push(Default::default());
    assert_invalid(&snapshot);
}
