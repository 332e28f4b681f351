//! HNSW insert operations.
//!
//! Insertion is split in two phases. [`NativeHnsw::plan_insert`] performs
//! every fallible read and stages the modified neighbor lists;
//! [`NativeHnsw::commit_insert`] applies a plan and cannot fail. A read error
//! in the first phase leaves the graph exactly as it was.

use super::super::distance::DistanceEngine;
use super::super::layer::{Layer, NodeId};
use super::neighbors::StagedLayer;
use super::{NativeHnsw, VectorSource, WithPending};
use crate::index::hnsw::level::MAX_LEVEL;

/// Staged result of an insert, ready to be committed.
#[derive(Debug)]
pub(crate) struct InsertPlan {
    node: NodeId,
    level: usize,
    /// `(layer, edits)` for every pre-existing layer the node joins.
    staged: Vec<(usize, StagedLayer)>,
}

impl<D: DistanceEngine> NativeHnsw<D> {
    /// Inserts `vector` as `node`: plans, then commits.
    ///
    /// The two phases stay inside the crate, since a plan only fits the
    /// graph it was staged against:
    ///
    /// ```compile_fail
    /// use vellum_core::index::hnsw::native::{DistanceFunction, NativeHnsw};
    ///
    /// let _commit = NativeHnsw::<DistanceFunction>::commit_insert;
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates vector read failures; the graph is unchanged on error.
    pub fn insert<V: VectorSource + ?Sized>(
        &mut self,
        source: &V,
        node: NodeId,
        vector: &[f32],
        level: Option<usize>,
    ) -> crate::Result<()> {
        let plan = self.plan_insert(source, node, vector, level)?;
        self.commit_insert(plan);
        Ok(())
    }

    /// Phase 1: computes the new node's neighbors on every layer it joins
    /// and the reciprocal edits, without touching the graph.
    ///
    /// `node` must not be in the graph yet; its vector is taken from
    /// `vector`, every other vector from `source`. Without an explicit
    /// `level` the next generator level is used; the draw itself is only
    /// consumed on commit, and it is consumed even when `level` is given.
    ///
    /// # Errors
    ///
    /// Propagates vector read failures from `source`.
    pub(crate) fn plan_insert<V: VectorSource + ?Sized>(
        &self,
        source: &V,
        node: NodeId,
        vector: &[f32],
        level: Option<usize>,
    ) -> crate::Result<InsertPlan> {
        let level = level.map_or_else(|| self.levels.peek_level(), |l| l.min(MAX_LEVEL));
        let mut plan = InsertPlan {
            node,
            level,
            staged: Vec::new(),
        };
        let Some(ep) = self.entry_point else {
            return Ok(plan);
        };

        let source = WithPending::new(source, node, vector);
        let top = self.top_layer();

        let mut current_ep = ep;
        for layer_idx in (level + 1..=top).rev() {
            current_ep = self.search_layer_single(&source, vector, current_ep, layer_idx)?;
        }

        let mut entry_points = vec![current_ep];
        for layer_idx in (0..=level.min(top)).rev() {
            let candidates = self.search_layer(
                &source,
                vector,
                &entry_points,
                self.params.ef_construction,
                layer_idx,
            )?;
            let max_conn = self.params.max_connections_for(layer_idx);
            let selected = self.select_neighbors(&source, &candidates, max_conn)?;

            let mut edits = StagedLayer::default();
            self.stage_connections(&source, node, &selected, layer_idx, max_conn, &mut edits)?;
            plan.staged.push((layer_idx, edits));

            if !candidates.is_empty() {
                entry_points = candidates.iter().map(|c| c.id).collect();
            }
        }

        Ok(plan)
    }

    /// Phase 2: applies a plan produced by [`Self::plan_insert`]. Infallible.
    ///
    /// The plan must be the latest one made: a plan staged before another
    /// commit carries neighbor lists that no longer match the graph.
    pub(crate) fn commit_insert(&mut self, plan: InsertPlan) {
        let InsertPlan {
            node,
            level,
            staged,
        } = plan;
        let _ = self.levels.next_level();

        let previous_layers = self.layers.len();
        while self.layers.len() <= level {
            self.layers.push(Layer::new());
        }

        for (layer_idx, edits) in staged {
            let layer = &mut self.layers[layer_idx];
            for (id, neighbors) in edits {
                layer.set_neighbors(id, neighbors);
            }
        }
        for layer in &mut self.layers[..=level] {
            if !layer.contains(node) {
                layer.set_neighbors(node, Default::default());
            }
        }

        if self.entry_point.is_none() || self.layers.len() > previous_layers {
            tracing::debug!(
                node,
                level,
                layers = self.layers.len(),
                "New entry point"
            );
            self.entry_point = Some(node);
        }
        self.count += 1;
    }
}
