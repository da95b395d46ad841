//! The multi-vector HNSW index.
//!
//! [`MultiVectorHnsw`] is a cheaply clonable handle over shared state; every
//! clone talks to the same graph. One `RwLock` guards the whole index, so
//! searches run concurrently with each other and writes serialize. Each
//! operation is atomic with respect to the lock; there are no multi-call
//! transactions.

mod graph;
mod insert;
mod search;
mod visited;

use crate::config;
use crate::distance::MultiVectorDistance;
use crate::error::{Error, Result};
use crate::vector::Vector;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

pub(crate) use graph::GraphStore;

/// Graph construction parameters, fixed for the lifetime of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Max neighbors per node per layer, and the base of the level
    /// distribution.
    pub m: usize,
    /// Beam width while connecting a new node.
    pub ef_construction: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::DEFAULT_M,
            ef_construction: config::DEFAULT_EF_CONSTRUCTION,
        }
    }
}

impl HnswConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(Error::InvalidConfig(format!(
                "m must be at least 2, got {}",
                self.m
            )));
        }
        if self.ef_construction < 1 {
            return Err(Error::InvalidConfig(format!(
                "ef_construction must be at least 1, got {}",
                self.ef_construction
            )));
        }
        Ok(())
    }
}

/// One search hit: the item's id and its aggregated distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub score: f64,
}

/// Everything behind the lock.
pub(crate) struct IndexData {
    pub config: HnswConfig,
    pub distance: Arc<dyn MultiVectorDistance>,
    pub graph: GraphStore,
}

/// Thread-safe approximate-nearest-neighbor index over multi-vector items.
///
/// ```
/// use multivec::distance::{Cosine, SquaredEuclidean, WeightedAverageDistance};
/// use multivec::{MultiVectorHnsw, Vector};
///
/// # fn main() -> multivec::Result<()> {
/// let distance = WeightedAverageDistance::builder()
///     .add(SquaredEuclidean, 0.7)
///     .add(Cosine, 0.3)
///     .build()?;
/// let index = MultiVectorHnsw::new(distance);
///
/// index.add(1, vec![
///     Vector::new(vec![1.0, 0.0])?,
///     Vector::new(vec![0.5, 0.5])?,
/// ])?;
///
/// let query = vec![
///     Vector::new(vec![1.0, 0.1])?,
///     Vector::new(vec![0.4, 0.6])?,
/// ];
/// let hits = index.search(&query, 1)?;
/// assert_eq!(hits[0].id, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MultiVectorHnsw {
    data: Arc<RwLock<IndexData>>,
}

impl MultiVectorHnsw {
    /// Creates an index with default construction parameters.
    pub fn new<D: MultiVectorDistance + 'static>(distance: D) -> Self {
        Self::from_data(IndexData {
            config: HnswConfig::default(),
            distance: Arc::new(distance),
            graph: GraphStore::default(),
        })
    }

    /// Starts a builder for non-default parameters.
    pub fn builder() -> HnswBuilder {
        HnswBuilder::default()
    }

    pub(crate) fn from_data(data: IndexData) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    // ── mutation ──────────────────────────────────────────────────────

    /// Adds an item under `id`.
    ///
    /// Fails with [`Error::DuplicateId`] when `id` is already active and
    /// [`Error::ArityMismatch`] when the vector count does not match the
    /// aggregator. A failed add leaves the index unchanged.
    pub fn add(&self, id: u64, vectors: Vec<Vector>) -> Result<()> {
        self.data.write().insert_item(id, vectors)
    }

    /// Adds a batch of items under one write lock.
    ///
    /// Items are inserted in order; the first failure aborts the batch and
    /// is returned, with the preceding items already committed.
    pub fn add_all<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, Vec<Vector>)>,
    {
        let mut data = self.data.write();
        for (id, vectors) in items {
            data.insert_item(id, vectors)?;
        }
        Ok(())
    }

    /// Replaces the item under `id`, or inserts it if absent.
    ///
    /// The new vectors are validated before the old item is tombstoned, so
    /// a rejected update leaves the previous item searchable.
    pub fn update(&self, id: u64, vectors: Vec<Vector>) -> Result<()> {
        let mut data = self.data.write();
        data.validate_item(&vectors)?;
        data.tombstone(id);
        data.insert_item(id, vectors)
    }

    /// Applies [`update`](Self::update) to a batch under one write lock.
    pub fn update_all<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, Vec<Vector>)>,
    {
        let mut data = self.data.write();
        for (id, vectors) in items {
            data.validate_item(&vectors)?;
            data.tombstone(id);
            data.insert_item(id, vectors)?;
        }
        Ok(())
    }

    /// Tombstones the item under `id`. Returns whether an active item was
    /// removed. The arena slot is reclaimed by [`vacuum`](Self::vacuum).
    pub fn remove(&self, id: u64) -> bool {
        self.data.write().tombstone(id)
    }

    /// Tombstones a batch of ids, returning how many were active.
    pub fn remove_all<I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = u64>,
    {
        let mut data = self.data.write();
        ids.into_iter().filter(|&id| data.tombstone(id)).count()
    }

    /// Drops every item, tombstoned or not.
    pub fn clear(&self) {
        self.data.write().graph.clear();
    }

    /// Rebuilds the graph from the active items, discarding tombstones.
    ///
    /// Runs under one write lock; concurrent searches block for the full
    /// rebuild. Edges are re-derived from scratch, so two vacuums of equal
    /// content may produce different graphs with equivalent behavior.
    pub fn vacuum(&self) -> Result<()> {
        let mut data = self.data.write();
        let tombstones = data.graph.tombstone_count();
        if tombstones == 0 {
            return Ok(());
        }
        let live: Vec<(u64, Vec<Vector>)> = data
            .graph
            .nodes
            .iter()
            .zip(data.graph.items.iter())
            .filter(|(node, _)| !node.deleted)
            .map(|(node, item)| (node.id, item.clone()))
            .collect();
        data.graph.clear();
        for (id, vectors) in live {
            data.insert_item(id, vectors)?;
        }
        tracing::info!(
            reclaimed = tombstones,
            live = data.graph.active_count(),
            "vacuum rebuilt graph"
        );
        Ok(())
    }

    // ── queries ───────────────────────────────────────────────────────

    /// Finds the `k` approximate nearest neighbors of `query`, using a beam
    /// width of `max(k, ef_construction)`.
    pub fn search(&self, query: &[Vector], k: usize) -> Result<Vec<SearchResult>> {
        let data = self.data.read();
        let ef = k.max(data.config.ef_construction);
        data.query(query, k, ef)
    }

    /// Finds the `k` approximate nearest neighbors with an explicit beam
    /// width. `ef_search` trades latency for recall and must be `>= k`.
    pub fn search_with_ef(&self, query: &[Vector], k: usize, ef_search: usize) -> Result<Vec<SearchResult>> {
        self.data.read().query(query, k, ef_search)
    }

    /// The vectors stored under `id`, if it is active.
    pub fn get(&self, id: u64) -> Option<Vec<Vector>> {
        let data = self.data.read();
        let handle = data.graph.active_handle(id)?;
        Some(data.graph.items[handle as usize].clone())
    }

    /// Whether an active item exists under `id`.
    pub fn contains(&self, id: u64) -> bool {
        self.data.read().graph.active_handle(id).is_some()
    }

    /// Ids of all active items.
    pub fn keys(&self) -> HashSet<u64> {
        let data = self.data.read();
        data.graph
            .nodes
            .iter()
            .filter(|node| !node.deleted)
            .map(|node| node.id)
            .collect()
    }

    /// Number of active items.
    pub fn len(&self) -> usize {
        self.data.read().graph.active_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tombstoned slots a [`vacuum`](Self::vacuum) would reclaim.
    pub fn tombstones(&self) -> usize {
        self.data.read().graph.tombstone_count()
    }

    /// The construction parameters this index was built with.
    pub fn config(&self) -> HnswConfig {
        self.data.read().config
    }

    /// The aggregator this index ranks with.
    pub fn distance(&self) -> Arc<dyn MultiVectorDistance> {
        Arc::clone(&self.data.read().distance)
    }

    // ── persistence ───────────────────────────────────────────────────

    /// Writes a snapshot of the index to `path`, atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::persistence::save(&self.data.read(), path.as_ref())
    }

    /// Restores an index from a snapshot written by [`save`](Self::save).
    ///
    /// Works only for snapshots whose aggregator was a
    /// [`WeightedAverageDistance`](crate::distance::WeightedAverageDistance)
    /// over shipped metrics; custom aggregators need
    /// [`load_with_distance`](Self::load_with_distance).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::persistence::load(path.as_ref(), None).map(Self::from_data)
    }

    /// Restores an index from a snapshot, ranking with the supplied
    /// aggregator. Required when the snapshot records a custom aggregator.
    pub fn load_with_distance<P, D>(path: P, distance: D) -> Result<Self>
    where
        P: AsRef<Path>,
        D: MultiVectorDistance + 'static,
    {
        crate::persistence::load(path.as_ref(), Some(Arc::new(distance))).map(Self::from_data)
    }
}

impl IndexData {
    /// Boundary validation shared by update paths.
    fn validate_item(&self, vectors: &[Vector]) -> Result<()> {
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
        Ok(())
    }

    /// Flips the tombstone for `id`. Returns whether it was active.
    fn tombstone(&mut self, id: u64) -> bool {
        match self.graph.active_handle(id) {
            Some(handle) => {
                self.graph.nodes[handle as usize].deleted = true;
                true
            }
            None => false,
        }
    }

    fn query(&self, query: &[Vector], k: usize, ef: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if ef < k {
            return Err(Error::InvalidArgument(format!(
                "ef_search ({ef}) must be at least k ({k})"
            )));
        }
        self.validate_item(query)?;
        Ok(self.knn(query, k, ef))
    }
}

/// Fluent builder for [`MultiVectorHnsw`].
#[derive(Default)]
pub struct HnswBuilder {
    config: Option<HnswConfig>,
    distance: Option<Arc<dyn MultiVectorDistance>>,
}

impl HnswBuilder {
    /// Sets M, the max neighbors per node per layer.
    pub fn m(mut self, m: usize) -> Self {
        self.config.get_or_insert_with(HnswConfig::default).m = m;
        self
    }

    /// Sets the construction beam width.
    pub fn ef_construction(mut self, ef_construction: usize) -> Self {
        self.config
            .get_or_insert_with(HnswConfig::default)
            .ef_construction = ef_construction;
        self
    }

    /// Sets the aggregator. Required.
    pub fn distance<D: MultiVectorDistance + 'static>(mut self, distance: D) -> Self {
        self.distance = Some(Arc::new(distance));
        self
    }

    /// Validates the configuration and builds an empty index.
    pub fn build(self) -> Result<MultiVectorHnsw> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let distance = self.distance.ok_or_else(|| {
            Error::InvalidConfig("an index needs a distance aggregator".to_string())
        })?;
        Ok(MultiVectorHnsw::from_data(IndexData {
            config,
            distance,
            graph: GraphStore::default(),
        }))
    }
}
