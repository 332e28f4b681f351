//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use comfy_table::{presets::UTF8_FULL, Table};
use vellum_core::distance::normalize_in_place;
use vellum_core::{
    load_snapshot, save_snapshot, DistanceMetric, HnswIndex, IndexSnapshot, LogVectorStore,
    MemoryVectorStore, SearchResult, SnapshotFormat, StorageBackend, VectorStore, VellumConfig,
};

use crate::input::RecordReader;

/// Vectors per bulk insert when `--batch-size` is not given.
pub const DEFAULT_BATCH_SIZE: usize = 100;

pub struct BuildArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub store: Option<PathBuf>,
    pub batch_size: usize,
    pub binary: bool,
}

pub struct QueryArgs {
    pub index: PathBuf,
    pub input: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub vector: String,
    pub k: Option<usize>,
    pub ef: Option<usize>,
    pub max_distance: Option<f32>,
    pub json: bool,
}

/// Streams the input into a fresh index in batches, then writes a snapshot.
///
/// A failed batch is logged and skipped; the build continues with the next.
pub fn build(mut config: VellumConfig, args: &BuildArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.batch_size > 0, "--batch-size must be > 0");
    if let Some(store) = &args.store {
        config.storage.backend = StorageBackend::Log;
        config.storage.path = Some(store.clone());
    }

    let metric = config.hnsw.metric()?;
    let mut index = config.open_index()?;
    let mut reader = RecordReader::open(&args.input)?;
    let started = Instant::now();
    let mut failed_batches = 0_usize;

    loop {
        let mut batch = reader.next_batch(args.batch_size)?;
        if batch.is_empty() {
            break;
        }
        for record in &mut batch {
            prepare(metric, &mut record.embedding);
        }
        let keys: Vec<&str> = batch.iter().map(|r| r.key.as_str()).collect();
        let vectors: Vec<&[f32]> = batch.iter().map(|r| r.embedding.as_slice()).collect();

        match index.bulk_insert(&keys, &vectors) {
            Ok(admitted) => tracing::debug!(admitted, total = index.len(), "Batch indexed"),
            Err(err) => {
                failed_batches += 1;
                tracing::warn!(
                    error = %err,
                    first_key = keys.first().copied().unwrap_or_default(),
                    batch = keys.len(),
                    "Skipping failed batch"
                );
            }
        }
    }

    let format = if args.binary {
        SnapshotFormat::Binary
    } else {
        SnapshotFormat::Json
    };
    save_snapshot(&args.output, &index.export_index(), format)?;

    println!(
        "Indexed {} vectors into {} layers in {:.2?} ({} failed batches)",
        index.len(),
        index.num_layers(),
        started.elapsed(),
        failed_batches
    );
    println!("Snapshot written to {}", args.output.display());
    Ok(())
}

/// Loads a snapshot, backs its vectors in and prints the ranked results.
pub fn query(config: &VellumConfig, args: &QueryArgs) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&args.index)
        .with_context(|| format!("cannot load snapshot {}", args.index.display()))?;
    let metric: DistanceMetric = snapshot
        .config
        .distance_function_id
        .parse()
        .map_err(anyhow::Error::msg)?;
    let mut vector: Vec<f32> = serde_json::from_str(&args.vector)
        .context("--vector must be a JSON array of numbers")?;
    prepare(metric, &mut vector);

    let index = match (&args.input, &args.store) {
        (_, Some(store)) => {
            let store: Box<dyn VectorStore> = Box::new(LogVectorStore::open(store)?);
            HnswIndex::from_snapshot(metric, &snapshot, store)?
        }
        (Some(input), None) => back_vectors_in(metric, &snapshot, input)?,
        (None, None) => anyhow::bail!("either --input or --store is required"),
    };

    let mut options = config.search.query_options(args.k);
    if let Some(ef) = args.ef {
        options.ef_search = Some(ef);
    }
    if let Some(max_distance) = args.max_distance {
        options.max_distance = Some(max_distance);
    }

    let hits = index.query_with(&vector, &options)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_hits(&hits);
    }
    Ok(())
}

/// Rebuilds the index from `snapshot` and backs in the vectors of every
/// input record whose key is a graph node.
fn back_vectors_in(
    metric: DistanceMetric,
    snapshot: &IndexSnapshot,
    input: &Path,
) -> anyhow::Result<HnswIndex<Box<dyn VectorStore>>> {
    let store: Box<dyn VectorStore> = Box::new(MemoryVectorStore::new());
    let mut index = HnswIndex::from_snapshot(metric, snapshot, store)?;

    let mut records = RecordReader::open(input)?.read_all()?;
    for record in &mut records {
        prepare(metric, &mut record.embedding);
    }
    let (known, unknown): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| index.contains(&r.key));
    if !unknown.is_empty() {
        tracing::warn!(skipped = unknown.len(), "Input records not in the snapshot");
    }

    let keys: Vec<&str> = known.iter().map(|r| r.key.as_str()).collect();
    let vectors: Vec<&[f32]> = known.iter().map(|r| r.embedding.as_slice()).collect();
    index.bulk_insert_skip_index(&keys, &vectors)?;
    Ok(index)
}

/// `cosine-normalized` expects unit vectors, so raw input is scaled first.
fn prepare(metric: DistanceMetric, vector: &mut [f32]) {
    if metric == DistanceMetric::CosineNormalized {
        normalize_in_place(vector);
    }
}

fn print_hits(hits: &[SearchResult]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Rank", "Key", "Distance"]);
    for (rank, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            hit.key.clone(),
            format!("{:.6}", hit.distance),
        ]);
    }
    println!("{table}");
}

/// Prints the snapshot configuration and a per-layer degree table.
pub fn inspect(path: &Path) -> anyhow::Result<()> {
    let snapshot =
        load_snapshot(path).with_context(|| format!("cannot load snapshot {}", path.display()))?;
    let config = &snapshot.config;

    println!("Nodes:        {}", snapshot.node_count);
    println!("Layers:       {}", snapshot.layers.len());
    println!(
        "Entry point:  {}",
        snapshot.entry_point.as_deref().unwrap_or("-")
    );
    println!("Distance:     {}", config.distance_function_id);
    println!("M / Mmax0:    {} / {}", config.m, config.m_max0);
    println!("efConstruction: {}", config.ef_construction);
    println!("Seed:         {}", config.seed);
    if let Some(dimension) = config.dimension {
        println!("Dimension:    {dimension}");
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Layer", "Nodes", "Links", "Avg degree", "Max degree"]);
    for (l, layer) in snapshot.layers.iter().enumerate() {
        let links: usize = layer.values().map(|n| n.len()).sum();
        let max_degree = layer.values().map(|n| n.len()).max().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)] // Reason: display-only ratio
        let avg = if layer.is_empty() {
            0.0
        } else {
            links as f64 / layer.len() as f64
        };
        table.add_row(vec![
            l.to_string(),
            layer.len().to_string(),
            links.to_string(),
            format!("{avg:.2}"),
            max_degree.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
