//! A store whose reads and writes can be made to fail on demand.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::helpers::{dataset, generate_embedding, DIM};
use vellum_core::{DistanceMetric, Error, HnswIndex, HnswParams, MemoryVectorStore, VectorStore};

#[derive(Default)]
struct FlakyStore {
    inner: MemoryVectorStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    single_reads: AtomicUsize,
    batch_reads: AtomicUsize,
}

impl FlakyStore {
    fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// `(get calls, bulk_get calls)` since the last call.
    fn take_reads(&self) -> (usize, usize) {
        (
            self.single_reads.swap(0, Ordering::SeqCst),
            self.batch_reads.swap(0, Ordering::SeqCst),
        )
    }
}

fn outage() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionRefused, "store offline")
}

impl VectorStore for FlakyStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<f32>>> {
        self.single_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.get(key)
    }

    fn bulk_get(&self, keys: &[&str]) -> io::Result<Vec<Option<Vec<f32>>>> {
        self.batch_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(outage());
        }
        keys.iter().map(|key| self.inner.get(key)).collect()
    }

    fn put(&mut self, key: &str, vector: &[f32]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.put(key, vector)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.inner.clear()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

fn flaky_index(seed: u64) -> HnswIndex<FlakyStore> {
    HnswIndex::with_store(
        DistanceMetric::Cosine,
        HnswParams::default().with_seed(seed),
        FlakyStore::default(),
    )
    .unwrap()
}

#[test]
fn test_failed_write_leaves_graph_untouched() {
    let (keys, vectors) = dataset(5);
    let mut index = flaky_index(10);
    for (key, vector) in keys.iter().zip(&vectors) {
        index.insert(key, vector).unwrap();
    }
    let before = index.export_index();

    index.store().fail_writes(true);
    let err = index.insert("late", &generate_embedding(77, DIM)).unwrap_err();

    assert!(matches!(err, Error::BackingStore(_)));
    assert!(!index.contains("late"));
    assert_eq!(index.export_index(), before);
    assert_eq!(index.store().len(), 5);
}

#[test]
fn test_failed_read_leaves_graph_untouched() {
    let (keys, vectors) = dataset(5);
    let mut index = flaky_index(10);
    for (key, vector) in keys.iter().zip(&vectors) {
        index.insert(key, vector).unwrap();
    }
    let before = index.export_index();

    index.store().fail_reads(true);
    let err = index.insert("late", &generate_embedding(77, DIM)).unwrap_err();
    assert!(matches!(err, Error::BackingStore(_)));
    assert_eq!(index.export_index(), before);
    assert!(matches!(
        index.query(&vectors[0], 1),
        Err(Error::BackingStore(_))
    ));

    index.store().fail_reads(false);
    index.insert("late", &generate_embedding(77, DIM)).unwrap();
    assert_eq!(index.len(), 6);
}

#[test]
fn test_failed_insert_does_not_shift_later_levels() {
    let (keys, vectors) = dataset(10);

    let mut interrupted = flaky_index(10);
    for (i, (key, vector)) in keys.iter().zip(&vectors).enumerate() {
        if i == 3 {
            interrupted.store().fail_reads(true);
            assert!(interrupted.insert("lost", &generate_embedding(77, DIM)).is_err());
            interrupted.store().fail_reads(false);
        }
        interrupted.insert(key, vector).unwrap();
    }

    let mut clean = flaky_index(10);
    for (key, vector) in keys.iter().zip(&vectors) {
        clean.insert(key, vector).unwrap();
    }

    assert_eq!(interrupted.export_index(), clean.export_index());
    assert_eq!(interrupted.layer_keys(1), vec![keys[3].clone(), keys[4].clone()]);
}

#[test]
fn test_failed_bulk_write_admits_nothing() {
    let (keys, vectors) = dataset(8);
    let mut index = flaky_index(10);
    index.store().fail_writes(true);

    assert!(matches!(
        index.bulk_insert(&keys, &vectors),
        Err(Error::BackingStore(_))
    ));
    assert!(index.is_empty());
    assert_eq!(index.dimension(), None);
}

#[test]
fn test_skip_index_checks_the_store_in_one_read() {
    let (keys, vectors) = dataset(12);
    let mut source = flaky_index(10);
    source.bulk_insert(&keys, &vectors).unwrap();

    let mut restored = flaky_index(3);
    restored.load_index(&source.export_index()).unwrap();
    restored.store().take_reads();

    assert_eq!(restored.bulk_insert_skip_index(&keys, &vectors).unwrap(), 12);
    assert_eq!(restored.store().take_reads(), (0, 1));

    restored.store().fail_reads(true);
    let err = restored
        .bulk_insert_skip_index(&keys[..1], &vectors[..1])
        .unwrap_err();
    assert!(matches!(err, Error::BackingStore(_)));
}
