//! The graph store: item arena, node arena, id lookup, and entry point.
//!
//! Nodes and item vector-lists live in dense, append-only arenas addressed
//! by a `u32` handle; neighbor lists hold handles, not ids, so traversal
//! never touches the id map. The `id -> handle` table is the only place
//! where caller-visible ids exist. A tombstoned node keeps its arena slot
//! (and its edges) until a vacuum rebuilds the graph from live items.

use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable index of a node (and its item) in the arenas.
pub(crate) type Handle = u32;

/// One node of the layered proximity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Node {
    /// Caller-visible id of the item this node indexes.
    pub id: u64,
    /// Highest layer this node participates in.
    pub level: usize,
    /// Neighbor handles per layer, `neighbors[l]` for `l in 0..=level`.
    /// Each list holds at most M distinct handles, never the node's own.
    pub neighbors: Vec<Vec<Handle>>,
    /// Tombstone flag; flips false -> true once, cleared only by rebuild.
    pub deleted: bool,
}

/// Arena-backed storage for items, nodes, and the entry point.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct GraphStore {
    /// Vector lists, parallel to `nodes`.
    pub items: Vec<Vec<Vector>>,
    pub nodes: Vec<Node>,
    /// Maps an id to its current handle. Tombstoned handles stay mapped
    /// until the id is re-added (which repoints the entry) or vacuumed.
    pub id_to_handle: HashMap<u64, Handle>,
    /// Handle of the node with the highest level ever inserted, if any.
    pub entry_point: Option<Handle>,
}

impl GraphStore {
    /// Appends a new node and its vectors, returning the fresh handle.
    /// The id map is repointed at the new handle.
    pub fn push(&mut self, id: u64, level: usize, vectors: Vec<Vector>) -> Handle {
        let handle = self.nodes.len() as Handle;
        self.items.push(vectors);
        self.nodes.push(Node {
            id,
            level,
            neighbors: vec![Vec::new(); level + 1],
            deleted: false,
        });
        self.id_to_handle.insert(id, handle);
        handle
    }

    /// Handle of the active (non-tombstoned) node for `id`, if one exists.
    pub fn active_handle(&self, id: u64) -> Option<Handle> {
        let handle = *self.id_to_handle.get(&id)?;
        if self.nodes[handle as usize].deleted {
            None
        } else {
            Some(handle)
        }
    }

    /// Number of active items.
    pub fn active_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.deleted).count()
    }

    /// Number of tombstoned arena slots awaiting vacuum.
    pub fn tombstone_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.deleted).count()
    }

    /// Drops everything: items, nodes, id map, and entry point.
    pub fn clear(&mut self) {
        self.items.clear();
        self.nodes.clear();
        self.id_to_handle.clear();
        self.entry_point = None;
    }

    /// Structural invariant check, run after deserializing a snapshot.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.nodes.len();
        if self.items.len() != n {
            return Err(format!(
                "item arena length {} != node arena length {}",
                self.items.len(),
                n
            ));
        }
        for (handle, item) in self.items.iter().enumerate() {
            if item.is_empty() {
                return Err(format!("item at handle {handle} has no vectors"));
            }
            if item.iter().any(|v| v.is_empty()) {
                return Err(format!("item at handle {handle} holds an empty vector"));
            }
        }
        for (handle, node) in self.nodes.iter().enumerate() {
            if node.neighbors.len() != node.level + 1 {
                return Err(format!(
                    "node {handle} has {} layers but level {}",
                    node.neighbors.len(),
                    node.level
                ));
            }
            for layer in &node.neighbors {
                for &neighbor in layer {
                    if neighbor as usize >= n {
                        return Err(format!(
                            "node {handle} references out-of-bounds neighbor {neighbor}"
                        ));
                    }
                }
            }
        }
        for (&id, &handle) in &self.id_to_handle {
            let Some(node) = self.nodes.get(handle as usize) else {
                return Err(format!("id {id} maps to out-of-bounds handle {handle}"));
            };
            if node.id != id {
                return Err(format!(
                    "id {id} maps to handle {handle} which belongs to id {}",
                    node.id
                ));
            }
        }
        if let Some(ep) = self.entry_point {
            if ep as usize >= n {
                return Err(format!("entry point {ep} out of bounds ({n} nodes)"));
            }
        } else if n != 0 && self.nodes.iter().any(|node| !node.deleted) {
            return Err("non-empty graph without an entry point".to_string());
        }
        Ok(())
    }
}
