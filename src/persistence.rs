//! Versioned index snapshots.
//!
//! Layout: a 4-byte file magic, a bincode payload, a 4-byte checksum magic,
//! and the big-endian CRC32 of the payload. Writes go to a sibling temp
//! file first and land with an atomic rename, so a crash mid-save leaves
//! the previous snapshot intact.
//!
//! The payload records the aggregator as an [`AggregatorSpec`]; snapshots of
//! a weighted average over shipped metrics restore without help, custom
//! aggregators must be resupplied by the caller.

use crate::distance::{AggregatorSpec, MultiVectorDistance, WeightedAverageDistance};
use crate::error::{Error, Result};
use crate::index::{GraphStore, HnswConfig, IndexData};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const FILE_MAGIC: &[u8; 4] = b"MVHX";
const CRC_MAGIC: &[u8; 4] = b"MVC1";
const FORMAT_VERSION: u32 = 1;

/// Borrowing view serialized on save.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    config: &'a HnswConfig,
    aggregator: AggregatorSpec,
    graph: &'a GraphStore,
}

/// Owned payload produced on load.
#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    config: HnswConfig,
    aggregator: AggregatorSpec,
    graph: GraphStore,
}

pub(crate) fn save(data: &IndexData, path: &Path) -> Result<()> {
    let payload = bincode::serialize(&SnapshotRef {
        version: FORMAT_VERSION,
        config: &data.config,
        aggregator: data.distance.spec(),
        graph: &data.graph,
    })
    .map_err(|e| Error::Snapshot(format!("serialization failed: {e}")))?;

    let mut bytes = Vec::with_capacity(payload.len() + 12);
    bytes.extend_from_slice(FILE_MAGIC);
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(CRC_MAGIC);
    bytes.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        nodes = data.graph.nodes.len(),
        "saved snapshot"
    );
    Ok(())
}

pub(crate) fn load(
    path: &Path,
    distance: Option<Arc<dyn MultiVectorDistance>>,
) -> Result<IndexData> {
    let bytes = fs::read(path)?;
    if bytes.len() < 12 {
        return Err(Error::Snapshot("file too short".to_string()));
    }
    if &bytes[..4] != FILE_MAGIC {
        return Err(Error::Snapshot("bad file magic".to_string()));
    }
    let (payload, trailer) = bytes[4..].split_at(bytes.len() - 12);
    if &trailer[..4] != CRC_MAGIC {
        return Err(Error::Snapshot("bad checksum magic".to_string()));
    }
    let stored = u32::from_be_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
    let actual = crc32fast::hash(payload);
    if stored != actual {
        return Err(Error::Snapshot(format!(
            "checksum mismatch: stored {stored:#010x}, computed {actual:#010x}"
        )));
    }

    let snapshot: Snapshot = bincode::deserialize(payload)
        .map_err(|e| Error::Snapshot(format!("deserialization failed: {e}")))?;
    if snapshot.version != FORMAT_VERSION {
        return Err(Error::Snapshot(format!(
            "unsupported format version {}",
            snapshot.version
        )));
    }
    snapshot.config.validate()?;
    snapshot
        .graph
        .validate()
        .map_err(|reason| Error::Snapshot(format!("invalid graph: {reason}")))?;

    let distance = match (distance, snapshot.aggregator) {
        (Some(supplied), _) => supplied,
        (None, AggregatorSpec::WeightedAverage { metrics, weights }) => {
            let metrics = metrics.into_iter().map(|kind| kind.metric()).collect();
            Arc::new(WeightedAverageDistance::from_parts(metrics, weights)?)
        }
        (None, AggregatorSpec::Custom) => {
            return Err(Error::Snapshot(
                "snapshot records a custom aggregator; restore with load_with_distance"
                    .to_string(),
            ));
        }
    };

    tracing::info!(
        path = %path.display(),
        nodes = snapshot.graph.nodes.len(),
        "loaded snapshot"
    );
    Ok(IndexData {
        config: snapshot.config,
        distance,
        graph: snapshot.graph,
    })
}
