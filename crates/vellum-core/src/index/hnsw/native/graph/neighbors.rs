//! HNSW neighbor selection and symmetric connection staging.

use super::super::distance::DistanceEngine;
use super::super::layer::{sort_by_distance, Neighbor, NeighborList, NodeId};
use super::{NativeHnsw, VectorSource};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Neighbor lists modified by an in-flight insert, keyed by node, for one layer.
pub(in crate::index::hnsw::native::graph) type StagedLayer = FxHashMap<NodeId, NeighborList>;

/// Nodes a connectivity check may visit before it gives up.
const REACHABILITY_BUDGET: usize = 256;

impl<D: DistanceEngine> NativeHnsw<D> {
    /// Diversity heuristic.
    ///
    /// `candidates` must be sorted by ascending distance to the target. A
    /// candidate is accepted only if it is strictly closer to the target than
    /// to every candidate accepted so far; rejected candidates backfill the
    /// remaining slots in their original order.
    pub(crate) fn select_neighbors<V: VectorSource + ?Sized>(
        &self,
        source: &V,
        candidates: &[Neighbor],
        max_neighbors: usize,
    ) -> crate::Result<NeighborList> {
        if candidates.len() <= max_neighbors {
            return Ok(candidates.iter().copied().collect());
        }

        let mut selected = NeighborList::new();
        let mut selected_vecs: Vec<Vec<f32>> = Vec::with_capacity(max_neighbors);
        let mut rejected: Vec<Neighbor> = Vec::new();

        for &candidate in candidates {
            if selected.len() >= max_neighbors {
                break;
            }

            let candidate_vec = source.vector(candidate.id)?;
            let is_diverse = selected_vecs.iter().all(|selected_vec| {
                candidate.distance < self.distance.distance(&candidate_vec, selected_vec)
            });

            if is_diverse {
                selected.push(candidate);
                selected_vecs.push(candidate_vec);
            } else {
                rejected.push(candidate);
            }
        }

        let free = max_neighbors - selected.len();
        selected.extend(rejected.into_iter().take(free));
        Ok(selected)
    }

    /// Neighbor slice of `node`, seeing staged edits first.
    fn staged_slice<'a>(
        &'a self,
        staged: &'a StagedLayer,
        layer: usize,
        node: NodeId,
    ) -> &'a [Neighbor] {
        match staged.get(&node) {
            Some(list) => list.as_slice(),
            None => self.layers.get(layer).map_or(&[], |l| l.neighbors(node)),
        }
    }

    /// Current neighbor list of `node`, seeing staged edits first.
    fn staged_neighbors(&self, staged: &StagedLayer, layer: usize, node: NodeId) -> NeighborList {
        self.staged_slice(staged, layer, node).iter().copied().collect()
    }

    /// Removes the edge `a`-`b` from both endpoints.
    fn unlink(&self, staged: &mut StagedLayer, layer: usize, a: NodeId, b: NodeId) {
        for (from, to) in [(a, b), (b, a)] {
            let mut list = self.staged_neighbors(staged, layer, from);
            list.retain(|n| n.id != to);
            staged.insert(from, list);
        }
    }

    /// Adds the edge `a`-`b` with the given cached distance on both endpoints.
    fn link(&self, staged: &mut StagedLayer, layer: usize, a: NodeId, b: NodeId, distance: f32) {
        for (from, to) in [(a, b), (b, a)] {
            let mut list = self.staged_neighbors(staged, layer, from);
            list.push(Neighbor::new(to, distance));
            staged.insert(from, list);
        }
    }

    /// Breadth-first search from `from` to `to` over the staged layer.
    ///
    /// Gives up after visiting [`REACHABILITY_BUDGET`] nodes and reports
    /// `false`, which callers treat as "would be disconnected".
    fn reachable(&self, staged: &StagedLayer, layer: usize, from: NodeId, to: NodeId) -> bool {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([from]);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            for n in self.staged_slice(staged, layer, current) {
                if n.id == to {
                    return true;
                }
                if visited.len() >= REACHABILITY_BUDGET {
                    return false;
                }
                if visited.insert(n.id) {
                    queue.push_back(n.id);
                }
            }
        }
        false
    }

    /// Stages `node`'s connections to `selected` on one layer.
    ///
    /// Each selected neighbor gets the reverse edge. A neighbor pushed over
    /// `max_conn` sheds edges until it is back at the cap, and every edge
    /// shed that way is removed from both endpoints, so the staged layer
    /// stays symmetric. Edges the heuristic rejects go first, farthest
    /// first, then the heuristic's own picks from the back. An edge is only
    /// shed if its endpoints stay connected without it, which keeps every
    /// layer a single component and the new node reachable from the entry
    /// point. When every candidate is a bridge the cap wins.
    pub(in crate::index::hnsw::native::graph) fn stage_connections<V: VectorSource + ?Sized>(
        &self,
        source: &V,
        node: NodeId,
        selected: &NeighborList,
        layer: usize,
        max_conn: usize,
        staged: &mut StagedLayer,
    ) -> crate::Result<()> {
        staged.insert(node, selected.clone());

        for neighbor in selected {
            let mut list = self.staged_neighbors(staged, layer, neighbor.id);
            list.push(Neighbor::new(node, neighbor.distance));
            let mut excess = list.len().saturating_sub(max_conn);
            staged.insert(neighbor.id, list.clone());
            if excess == 0 {
                continue;
            }

            sort_by_distance(&mut list);
            let kept = self.select_neighbors(source, &list, max_conn)?;
            let is_kept = |id: NodeId| kept.iter().any(|k| k.id == id);
            let shed_order: Vec<Neighbor> = list
                .iter()
                .rev()
                .filter(|n| !is_kept(n.id))
                .chain(kept.iter().rev())
                .copied()
                .collect();

            let mut bridges: Vec<Neighbor> = Vec::new();
            for candidate in shed_order {
                if excess == 0 {
                    break;
                }
                self.unlink(staged, layer, neighbor.id, candidate.id);
                if self.reachable(staged, layer, candidate.id, neighbor.id) {
                    excess -= 1;
                } else {
                    self.link(staged, layer, neighbor.id, candidate.id, candidate.distance);
                    bridges.push(candidate);
                }
            }

            if excess > 0 {
                tracing::debug!(
                    node = neighbor.id,
                    layer,
                    excess,
                    "Every prunable edge is a bridge, pruning to cap anyway"
                );
                for candidate in bridges.into_iter().take(excess) {
                    self.unlink(staged, layer, neighbor.id, candidate.id);
                }
            }
        }

        Ok(())
    }
}
