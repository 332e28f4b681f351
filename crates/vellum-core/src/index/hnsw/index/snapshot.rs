//! Export and wholesale load of the graph.

use super::HnswIndex;
use crate::error::{Error, Result};
use crate::index::hnsw::mappings::KeyMap;
use crate::index::hnsw::native::{
    DistanceEngine, DistanceFunction, Layer, NativeHnsw, Neighbor, NeighborList, NodeId,
};
use crate::index::hnsw::params::HnswParams;
use crate::index::hnsw::persistence::{IndexSnapshot, SnapshotConfig, SnapshotLayer};
use crate::storage::VectorStore;
use indexmap::IndexMap;

impl<S: VectorStore> HnswIndex<S> {
    /// Captures the graph: every layer, the entry point, the node count and
    /// the configuration. Vectors are not part of a snapshot.
    #[must_use]
    pub fn export_index(&self) -> IndexSnapshot {
        let layers = (0..self.graph.num_layers())
            .filter_map(|l| self.graph.layer(l))
            .map(|layer| self.export_layer(layer))
            .collect();

        let params = self.graph.params();
        IndexSnapshot {
            layers,
            entry_point: self.entry_point().map(str::to_string),
            node_count: self.len(),
            config: SnapshotConfig {
                m: params.max_connections,
                m_max0: params.max_connections_0,
                ef_construction: params.ef_construction,
                ef_search: params.ef_search,
                seed: self.graph.seed(),
                distance_function_id: self.distance_id().to_string(),
                dimension: self.dimension,
            },
        }
    }

    fn export_layer(&self, layer: &Layer) -> SnapshotLayer {
        let mut out = SnapshotLayer::with_capacity(layer.len());
        for id in layer.node_ids() {
            let Some(key) = self.keys.key(id) else {
                continue;
            };
            let neighbors: IndexMap<String, f32> = layer
                .neighbors(id)
                .iter()
                .filter_map(|n| self.keys.key(n.id).map(|k| (k.to_string(), n.distance)))
                .collect();
            out.insert(key.to_string(), neighbors);
        }
        out
    }

    /// Replaces the graph with `snapshot`.
    ///
    /// The snapshot's parameters and seed are adopted; the level generator
    /// resumes where the exported index left off. Nothing of the previous
    /// index survives: the vector store is cleared, and the snapshot's
    /// vectors are backed in afterwards with [`Self::bulk_insert_skip_index`].
    /// To reuse a store that already holds them, open the index with
    /// [`Self::from_snapshot`] instead.
    ///
    /// On error the current graph is kept.
    ///
    /// # Errors
    ///
    /// - `Error::IncompatibleSnapshot` if the distance function differs
    /// - `Error::InvalidSnapshot` if the snapshot is structurally inconsistent
    /// - `Error::BackingStore` if the store cannot be cleared
    pub fn load_index(&mut self, snapshot: &IndexSnapshot) -> Result<()> {
        let distance = self.graph.distance_engine().clone();
        let (graph, keys) = build_graph(distance, snapshot)?;

        let stale = self.store.len();
        self.store.clear().map_err(Error::BackingStore)?;
        if stale > 0 {
            tracing::debug!(stale, "Cleared vectors of the replaced graph");
        }

        self.graph = graph;
        self.keys = keys;
        self.dimension = snapshot.config.dimension;
        tracing::info!(
            nodes = snapshot.node_count,
            layers = snapshot.layers.len(),
            "Index loaded from snapshot"
        );
        Ok(())
    }

    /// Creates an index from `snapshot` over `store`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_index`].
    pub fn from_snapshot(
        distance: impl Into<DistanceFunction>,
        snapshot: &IndexSnapshot,
        store: S,
    ) -> Result<Self> {
        let (graph, keys) = build_graph(distance.into(), snapshot)?;
        Ok(Self {
            graph,
            keys,
            store,
            dimension: snapshot.config.dimension,
        })
    }
}

/// Validates `snapshot` and rebuilds graph and key map from it.
fn build_graph(
    distance: DistanceFunction,
    snapshot: &IndexSnapshot,
) -> Result<(NativeHnsw<DistanceFunction>, KeyMap)> {
    let config = &snapshot.config;
    if config.distance_function_id != distance.id() {
        return Err(Error::IncompatibleSnapshot(format!(
            "snapshot uses distance '{}', index uses '{}'",
            config.distance_function_id,
            distance.id()
        )));
    }

    let params = HnswParams::custom(config.m, config.m_max0, config.ef_construction, config.ef_search)
        .with_seed(config.seed);
    params
        .validate()
        .map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

    let bottom_len = snapshot.layers.first().map_or(0, IndexMap::len);
    if snapshot.node_count != bottom_len {
        return Err(invalid(format!(
            "nodeCount is {} but layer 0 has {bottom_len} nodes",
            snapshot.node_count
        )));
    }

    let mut keys = KeyMap::default();
    if let Some(bottom) = snapshot.layers.first() {
        for key in bottom.keys() {
            keys.push(key);
        }
    }

    let mut layers = Vec::with_capacity(snapshot.layers.len());
    for (l, snapshot_layer) in snapshot.layers.iter().enumerate() {
        if snapshot_layer.is_empty() {
            return Err(invalid(format!("layer {l} is empty")));
        }
        let mut layer = Layer::new();
        for (key, neighbors) in snapshot_layer {
            let id = node_id(&keys, key, l)?;
            if l > 0 && !snapshot.layers[l - 1].contains_key(key) {
                return Err(invalid(format!(
                    "node {key} is in layer {l} but not in layer {}",
                    l - 1
                )));
            }

            let mut list = NeighborList::with_capacity(neighbors.len());
            for (neighbor_key, &distance) in neighbors {
                if !snapshot_layer.contains_key(neighbor_key) {
                    return Err(invalid(format!(
                        "neighbor {neighbor_key} of {key} is not in layer {l}"
                    )));
                }
                list.push(Neighbor::new(node_id(&keys, neighbor_key, l)?, distance));
            }
            layer.set_neighbors(id, list);
        }
        layers.push(layer);
    }

    let entry_point = match (&snapshot.entry_point, snapshot.layers.last()) {
        (None, None) => None,
        (Some(key), Some(top)) if top.contains_key(key) => Some(node_id(&keys, key, 0)?),
        (Some(key), _) => {
            return Err(invalid(format!("entry point {key} is not in the top layer")));
        }
        (None, Some(_)) => return Err(invalid("missing entry point".to_string())),
    };

    let graph = NativeHnsw::from_parts(
        distance,
        params,
        config.seed,
        layers,
        entry_point,
        snapshot.node_count,
    );
    Ok((graph, keys))
}

fn node_id(keys: &KeyMap, key: &str, layer: usize) -> Result<NodeId> {
    keys.id(key)
        .ok_or_else(|| invalid(format!("node {key} in layer {layer} is not in layer 0")))
}

fn invalid(message: String) -> Error {
    Error::InvalidSnapshot(message)
}
