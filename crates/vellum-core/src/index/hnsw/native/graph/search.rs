//! HNSW search operations.

use super::super::distance::DistanceEngine;
use super::super::layer::{sort_by_distance, Neighbor, NodeId};
use super::super::ordered_float::OrderedFloat;
use super::{NativeHnsw, VectorSource};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

impl<D: DistanceEngine> NativeHnsw<D> {
    /// Searches for the `k` nearest neighbors of `query`.
    ///
    /// Descends greedily through every layer above 0, then runs a beam of
    /// width `max(ef_search, k)` on layer 0. Results are ascending by
    /// distance, ties broken by insertion order.
    ///
    /// # Errors
    ///
    /// Propagates vector read failures from `source`.
    pub fn search<V: VectorSource + ?Sized>(
        &self,
        source: &V,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> crate::Result<Vec<Neighbor>> {
        let Some(ep) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut current_ep = ep;
        for layer_idx in (1..=self.top_layer()).rev() {
            current_ep = self.search_layer_single(source, query, current_ep, layer_idx)?;
        }

        let mut candidates =
            self.search_layer(source, query, &[current_ep], ef_search.max(k), 0)?;
        candidates.truncate(k);
        Ok(candidates)
    }

    // =========================================================================
    // Layer-level search helpers
    // =========================================================================

    /// Greedy walk with beam width 1: moves to the best improving neighbor
    /// until none improves.
    pub(in crate::index::hnsw::native::graph) fn search_layer_single<V: VectorSource + ?Sized>(
        &self,
        source: &V,
        query: &[f32],
        entry: NodeId,
        layer: usize,
    ) -> crate::Result<NodeId> {
        let mut best = entry;
        let mut best_dist = self.distance.distance(query, &source.vector(entry)?);

        loop {
            let mut improved = false;

            for neighbor in self.layers[layer].neighbors(best) {
                let dist = self.distance.distance(query, &source.vector(neighbor.id)?);
                if dist < best_dist {
                    best = neighbor.id;
                    best_dist = dist;
                    improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        Ok(best)
    }

    /// Search a single layer with ef candidates.
    ///
    /// Returns up to `ef` nodes sorted by ascending distance to `query`.
    pub(in crate::index::hnsw::native::graph) fn search_layer<V: VectorSource + ?Sized>(
        &self,
        source: &V,
        query: &[f32],
        entry_points: &[NodeId],
        ef: usize,
        layer: usize,
    ) -> crate::Result<Vec<Neighbor>> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, NodeId)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, NodeId)> = BinaryHeap::new();

        for &ep in entry_points {
            if !visited.insert(ep) {
                continue;
            }
            let dist = self.distance.distance(query, &source.vector(ep)?);
            candidates.push(Reverse((OrderedFloat(dist), ep)));
            results.push((OrderedFloat(dist), ep));
            if results.len() > ef {
                results.pop();
            }
        }

        while let Some(Reverse(closest)) = candidates.pop() {
            if results.len() >= ef && results.peek().is_some_and(|worst| closest > *worst) {
                break;
            }

            for neighbor in self.layers[layer].neighbors(closest.1) {
                if !visited.insert(neighbor.id) {
                    continue;
                }
                let dist = self.distance.distance(query, &source.vector(neighbor.id)?);
                let entry = (OrderedFloat(dist), neighbor.id);

                if results.len() < ef || results.peek().is_some_and(|worst| entry < *worst) {
                    candidates.push(Reverse(entry));
                    results.push(entry);

                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut result_vec: Vec<Neighbor> = results
            .into_iter()
            .map(|(d, n)| Neighbor::new(n, d.0))
            .collect();
        sort_by_distance(&mut result_vec);
        Ok(result_vec)
    }
}
