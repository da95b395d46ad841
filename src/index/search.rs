//! Layered beam search.
//!
//! `search_layer` is the single-layer primitive shared by queries and
//! insertion: a bounded best-first walk with a min-heap of unexplored
//! candidates and a max-heap of the `ef` best results found so far.
//! `knn` wires it into the full top-down descent.

use crate::index::graph::Handle;
use crate::index::visited::VisitedSet;
use crate::index::{IndexData, SearchResult};
use crate::vector::Vector;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

/// Unexplored node: max-heap on negative distance = min-heap on distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    neg_distance: OrderedFloat<f64>,
    handle: Handle,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.neg_distance.cmp(&other.neg_distance)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Accepted result: max-heap on distance, so the worst is one peek away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResultEntry {
    distance: OrderedFloat<f64>,
    handle: Handle,
}

impl Ord for ResultEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance.cmp(&other.distance)
    }
}

impl PartialOrd for ResultEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl IndexData {
    /// Aggregated distance from a query to a stored item.
    ///
    /// Comparison failures cannot occur after boundary validation; if one
    /// does, the item ranks at infinity rather than aborting a traversal
    /// that holds partially-built state.
    pub(crate) fn distance_to(&self, query: &[Vector], handle: Handle) -> f64 {
        self.distance
            .compute(query, &self.graph.items[handle as usize])
            .unwrap_or(f64::MAX)
    }

    /// Aggregated distance between two stored items.
    pub(crate) fn pair_distance(&self, a: Handle, b: Handle) -> f64 {
        self.distance
            .compute(&self.graph.items[a as usize], &self.graph.items[b as usize])
            .unwrap_or(f64::MAX)
    }

    /// Best-first search bounded to one layer.
    ///
    /// Returns up to `ef` non-tombstoned nodes sorted ascending by
    /// distance. A tombstoned (or absent) entry yields no results: the
    /// layer is unreachable from it.
    pub(crate) fn search_layer(
        &self,
        query: &[Vector],
        entry: Handle,
        ef: usize,
        layer: usize,
        visited: &mut VisitedSet,
    ) -> Vec<(f64, Handle)> {
        if self.graph.nodes[entry as usize].deleted {
            return Vec::new();
        }
        visited.reset(self.graph.nodes.len());

        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef * 2);
        let mut results: BinaryHeap<ResultEntry> = BinaryHeap::with_capacity(ef + 1);
        let mut worst = f64::MAX;

        let entry_dist = self.distance_to(query, entry);
        visited.insert(entry);
        candidates.push(Candidate {
            neg_distance: OrderedFloat(-entry_dist),
            handle: entry,
        });
        results.push(ResultEntry {
            distance: OrderedFloat(entry_dist),
            handle: entry,
        });
        if results.len() >= ef {
            worst = entry_dist;
        }

        while let Some(candidate) = candidates.pop() {
            let dist = -candidate.neg_distance.0;
            // Nothing beyond the current frontier can improve the result set.
            if results.len() >= ef && dist > worst {
                break;
            }

            let node = &self.graph.nodes[candidate.handle as usize];
            if layer >= node.neighbors.len() {
                continue;
            }
            for &neighbor in &node.neighbors[layer] {
                if !visited.insert(neighbor) {
                    continue;
                }
                if self.graph.nodes[neighbor as usize].deleted {
                    continue;
                }
                let neighbor_dist = self.distance_to(query, neighbor);
                if results.len() < ef || neighbor_dist < worst {
                    candidates.push(Candidate {
                        neg_distance: OrderedFloat(-neighbor_dist),
                        handle: neighbor,
                    });
                    results.push(ResultEntry {
                        distance: OrderedFloat(neighbor_dist),
                        handle: neighbor,
                    });
                    if results.len() > ef {
                        results.pop();
                    }
                    worst = results.peek().map_or(f64::MAX, |r| r.distance.0);
                }
            }
        }

        results
            .into_sorted_vec()
            .into_iter()
            .map(|r| (r.distance.0, r.handle))
            .collect()
    }

    /// Full top-down k-nearest-neighbor search.
    ///
    /// Greedy ef=1 descent from the entry point's layer down to layer 1,
    /// then a beam search with width `ef` at layer 0, sorted and truncated
    /// to `k`.
    pub(crate) fn knn(&self, query: &[Vector], k: usize, ef: usize) -> Vec<SearchResult> {
        let Some(mut entry) = self.graph.entry_point else {
            return Vec::new();
        };
        if self.graph.nodes[entry as usize].deleted {
            // The recorded entry point was tombstoned; fall back to any
            // active node. Linear in the arena, flagged as a known cost.
            match self.graph.nodes.iter().position(|n| !n.deleted) {
                Some(handle) => {
                    entry = handle as Handle;
                    tracing::warn!(
                        substitute = entry,
                        "entry point tombstoned, using substitute"
                    );
                }
                None => return Vec::new(),
            }
        }

        let mut visited = VisitedSet::new(self.graph.nodes.len());
        let top = self.graph.nodes[entry as usize].level;
        for layer in (1..=top).rev() {
            let found = self.search_layer(query, entry, 1, layer, &mut visited);
            if let Some(&(_, nearest)) = found.first() {
                entry = nearest;
            }
        }

        self.search_layer(query, entry, ef, 0, &mut visited)
            .into_iter()
            .take(k)
            .map(|(score, handle)| SearchResult {
                id: self.graph.nodes[handle as usize].id,
                score,
            })
            .collect()
    }
}
