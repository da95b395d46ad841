//! Tuning constants for multivec.
//!
//! Compile-time defaults; per-index values are set through
//! [`HnswConfig`](crate::index::HnswConfig) at construction time.

/// Default number of neighbors retained per node per layer (M).
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64.
pub const DEFAULT_M: usize = 16;

/// Default beam width during index construction (efConstruction).
///
/// Controls the size of the candidate list while connecting a new node.
/// Higher values produce a better graph but slow down inserts.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Upper bound on the sampled layer of any node.
///
/// Layer assignment is `floor(-ln(U) / ln(M))` with `U` uniform in (0,1);
/// the cap binds only in the vanishing tail of that distribution and keeps
/// the `U -> 0` edge case finite.
pub const MAX_LEVEL: usize = 16;
