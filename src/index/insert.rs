//! Graph construction: level assignment, insertion, and pruning.

use crate::config;
use crate::error::{Error, Result};
use crate::index::graph::Handle;
use crate::index::visited::VisitedSet;
use crate::index::IndexData;
use crate::vector::Vector;

/// Draws a level from the geometric distribution `floor(-ln(U) / ln(M))`,
/// capped so a pathological draw cannot allocate an absurd layer stack.
pub(crate) fn random_level(m: usize) -> usize {
    let u: f64 = rand::random();
    let level = (-u.ln() / (m as f64).ln()).floor();
    (level as usize).min(config::MAX_LEVEL)
}

impl IndexData {
    /// Inserts one item. Callers hold the write lock.
    ///
    /// Validation happens before any mutation, so a rejected insert leaves
    /// the graph untouched.
    pub(crate) fn insert_item(&mut self, id: u64, vectors: Vec<Vector>) -> Result<()> {
        if self.graph.active_handle(id).is_some() {
            return Err(Error::DuplicateId(id));
        }
        if vectors.is_empty() {
            return Err(Error::InvalidArgument(
                "an item needs at least one vector".to_string(),
            ));
        }
        if let Some(expected) = self.distance.arity() {
            if vectors.len() != expected {
                return Err(Error::ArityMismatch {
                    expected,
                    actual: vectors.len(),
                });
            }
        }

        let level = random_level(self.config.m);
        // The arena append invalidates nothing, but the query must outlive
        // it, so keep an owned copy for the searches below.
        let query = vectors.clone();
        let previous_entry = self.graph.entry_point;
        let new_handle = self.graph.push(id, level, vectors);
        tracing::debug!(id, level, handle = new_handle, "inserted node");

        let Some(entry) = previous_entry else {
            self.graph.entry_point = Some(new_handle);
            return Ok(());
        };

        let entry_level = self.graph.nodes[entry as usize].level;
        let mut visited = VisitedSet::new(self.graph.nodes.len());

        // Greedy descent through the layers above the new node's level.
        let mut nearest = entry;
        for layer in (level + 1..=entry_level).rev() {
            match self
                .search_layer(&query, nearest, 1, layer, &mut visited)
                .first()
            {
                Some(&(_, handle)) => nearest = handle,
                None => break,
            }
        }

        // Connect on every layer the new node shares with the graph.
        for layer in (0..=level.min(entry_level)).rev() {
            let candidates =
                self.search_layer(&query, nearest, self.config.ef_construction, layer, &mut visited);
            if candidates.is_empty() {
                break;
            }

            let selected: Vec<Handle> = candidates
                .iter()
                .take(self.config.m)
                .map(|&(_, handle)| handle)
                .collect();
            self.graph.nodes[new_handle as usize].neighbors[layer] = selected.clone();

            for neighbor in selected {
                let list = &mut self.graph.nodes[neighbor as usize].neighbors[layer];
                list.push(new_handle);
                if list.len() > self.config.m {
                    self.prune_neighbors(neighbor, layer);
                }
            }

            nearest = candidates[0].1;
        }

        if level > entry_level {
            tracing::debug!(id, level, "new entry point");
            self.graph.entry_point = Some(new_handle);
        }
        Ok(())
    }

    /// Shrinks an over-full neighbor list back to the closest M, ranked by
    /// true aggregated distance.
    fn prune_neighbors(&mut self, handle: Handle, layer: usize) {
        let current = self.graph.nodes[handle as usize].neighbors[layer].clone();
        let mut ranked: Vec<(f64, Handle)> = current
            .into_iter()
            .map(|neighbor| (self.pair_distance(handle, neighbor), neighbor))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked.truncate(self.config.m);
        self.graph.nodes[handle as usize].neighbors[layer] =
            ranked.into_iter().map(|(_, neighbor)| neighbor).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_level_distribution() {
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            let level = random_level(16);
            assert!(level <= config::MAX_LEVEL);
            if level < counts.len() {
                counts[level] += 1;
            }
        }
        // With M = 16, ~93.75% of draws land on level 0 and ~5.9% on
        // level 1. Wide tolerances keep this stable across rng seeds.
        assert!(counts[0] > 9_000, "level 0 count {}", counts[0]);
        assert!(counts[1] < 1_000, "level 1 count {}", counts[1]);
    }

    #[test]
    fn test_random_level_capped() {
        for _ in 0..1_000 {
            assert!(random_level(2) <= config::MAX_LEVEL);
        }
    }
}
