//! Index snapshot format and file codec.
//!
//! # Snapshot Layout
//!
//! A snapshot holds the whole graph keyed by caller keys:
//! `layers[l][node][neighbor] = distance`, bottom layer first, nodes and
//! neighbors in insertion order. The JSON form uses camelCase field names.
//!
//! # On-Disk Format
//!
//! - JSON: the snapshot serialized with `serde_json`
//! - Binary: `[Magic: "VLMS" 4 bytes] [Version: 1 byte] [bincode payload]`
//!
//! [`load_snapshot`] detects the format from the magic bytes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Binary snapshot magic bytes.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"VLMS";

/// Current binary snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// One graph layer: node key -> neighbor key -> cached distance.
pub type SnapshotLayer = IndexMap<String, IndexMap<String, f32>>;

/// Configuration recorded alongside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotConfig {
    /// Max neighbors per node on layers >= 1.
    pub m: usize,
    /// Max neighbors per node on layer 0.
    pub m_max0: usize,
    /// Construction beam width.
    pub ef_construction: usize,
    /// Default query beam width.
    pub ef_search: usize,
    /// Level generator seed.
    pub seed: u64,
    /// Identifier of the distance function the graph was built with.
    pub distance_function_id: String,
    /// Vector dimension, if any vector was inserted.
    pub dimension: Option<usize>,
}

/// Complete graph state of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// Layers, bottom (densest) first.
    pub layers: Vec<SnapshotLayer>,
    /// Entry point key; `None` for an empty index.
    pub entry_point: Option<String>,
    /// Number of nodes; equals the size of layer 0.
    pub node_count: usize,
    /// Construction configuration.
    pub config: SnapshotConfig,
}

impl IndexSnapshot {
    /// Encodes the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if the input is not a snapshot.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the snapshot in the binary format, header included.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(SNAPSHOT_MAGIC.len() + 1);
        buf.extend_from_slice(SNAPSHOT_MAGIC);
        buf.push(SNAPSHOT_VERSION);
        bincode::serialize_into(&mut buf, self)?;
        Ok(buf)
    }

    /// Decodes a snapshot in either format.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSnapshot` for an unsupported binary version and
    /// `Error::Serialization` if decoding fails.
    pub fn from_bytes(data: &[u8]) -> crate::Result<Self> {
        match data.strip_prefix(SNAPSHOT_MAGIC.as_slice()) {
            Some([version, payload @ ..]) => {
                if *version != SNAPSHOT_VERSION {
                    return Err(crate::Error::InvalidSnapshot(format!(
                        "unsupported snapshot version {version}"
                    )));
                }
                Ok(bincode::deserialize(payload)?)
            }
            Some([]) => Err(crate::Error::InvalidSnapshot(
                "truncated snapshot header".to_string(),
            )),
            None => Ok(serde_json::from_slice(data)?),
        }
    }
}

/// Snapshot file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    /// Human-readable JSON.
    #[default]
    Json,
    /// Magic header plus bincode payload.
    Binary,
}

/// Writes `snapshot` to `path`.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be written and
/// `Error::Serialization` if encoding fails.
pub fn save_snapshot(path: &Path, snapshot: &IndexSnapshot, format: SnapshotFormat) -> crate::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match format {
        SnapshotFormat::Json => serde_json::to_writer(&mut writer, snapshot)?,
        SnapshotFormat::Binary => writer.write_all(&snapshot.to_bytes()?)?,
    }
    writer.flush()?;
    tracing::info!(
        path = %path.display(),
        nodes = snapshot.node_count,
        layers = snapshot.layers.len(),
        ?format,
        "Snapshot saved"
    );
    Ok(())
}

/// Reads a snapshot from `path`, detecting its format.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read and
/// `Error::Serialization` / `Error::InvalidSnapshot` if it cannot be decoded.
pub fn load_snapshot(path: &Path) -> crate::Result<IndexSnapshot> {
    let data = std::fs::read(path)?;
    IndexSnapshot::from_bytes(&data)
}
