//! Error types for multivec.
//!
//! One central enum covers every failure the public API can report. All
//! variants are surfaced synchronously to the caller of the operation that
//! detected them; nothing is retried internally, and no operation mutates
//! visible state before its validation passes.

/// Errors reported by index, distance, and persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two vectors being compared or combined have different lengths.
    #[error("vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Two multi-vector lists have different lengths.
    #[error("vector list length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A multi-vector list does not match the aggregator's configured field count.
    #[error("aggregator expects {expected} vectors per item, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Invalid index or aggregator configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `add` called for an id that is currently active.
    #[error("item {0} already exists; remove it first or use update")]
    DuplicateId(u64),

    /// Invalid search argument (e.g. `ef_search < k`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O failure during save/load, propagated unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Snapshot is corrupted, has an unknown format, or cannot be restored.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
