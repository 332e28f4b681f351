//! `vellum` - build, query and inspect HNSW index snapshots.

mod commands;
mod input;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vellum_core::VellumConfig;

/// Vellum - incremental HNSW index for embedding retrieval
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./vellum.toml when present)
    #[arg(short, long, global = true, env = "VELLUM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an index from a JSONL embedding file and write a snapshot
    Build {
        /// JSONL input: `{"key": .., "embedding": [..]}` or `[text, [..]]` per line
        #[arg(short, long)]
        input: PathBuf,

        /// Snapshot output path
        #[arg(short, long)]
        output: PathBuf,

        /// Keep vectors in a durable log store in this directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Vectors per bulk insert
        #[arg(long, default_value_t = commands::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Write the binary snapshot format instead of JSON
        #[arg(long)]
        binary: bool,
    },

    /// Load a snapshot and run a query against it
    Query {
        /// Snapshot path (JSON or binary)
        #[arg(long)]
        index: PathBuf,

        /// JSONL file holding the vectors of the indexed keys
        #[arg(short, long, conflicts_with = "store", required_unless_present = "store")]
        input: Option<PathBuf>,

        /// Durable log store holding the vectors
        #[arg(long)]
        store: Option<PathBuf>,

        /// Query vector as a JSON array
        #[arg(long)]
        vector: String,

        /// Number of results
        #[arg(short)]
        k: Option<usize>,

        /// Query beam width
        #[arg(long)]
        ef: Option<usize>,

        /// Drop results farther than this
        #[arg(long)]
        max_distance: Option<f32>,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print layer statistics of a snapshot
    Inspect {
        /// Snapshot path (JSON or binary)
        #[arg(long)]
        index: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<VellumConfig> {
    let config = match path {
        Some(path) => VellumConfig::load_from(path)?,
        None => VellumConfig::load()?,
    };
    Ok(config)
}

fn init_tracing(config: &VellumConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config);

    match cli.command {
        Command::Build {
            input,
            output,
            store,
            batch_size,
            binary,
        } => commands::build(
            config,
            &commands::BuildArgs {
                input,
                output,
                store,
                batch_size,
                binary,
            },
        ),
        Command::Query {
            index,
            input,
            store,
            vector,
            k,
            ef,
            max_distance,
            json,
        } => commands::query(
            &config,
            &commands::QueryArgs {
                index,
                input,
                store,
                vector,
                k,
                ef,
                max_distance,
                json,
            },
        ),
        Command::Inspect { index } => commands::inspect(&index),
    }
}
