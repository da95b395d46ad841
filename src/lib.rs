//! multivec: an in-memory approximate-nearest-neighbor index over
//! multi-vector items.
//!
//! Each item is a fixed-arity list of vectors (say, a title embedding and a
//! body embedding) keyed by a `u64` id. Per-field distances are folded into
//! one score by a [`distance::MultiVectorDistance`], typically a
//! [`distance::WeightedAverageDistance`], and search runs over a
//! hierarchical navigable small world graph.
//!
//! The index is a clonable handle: clones share state, reads run in
//! parallel, and writes serialize behind one lock. Snapshots round-trip the
//! whole graph through [`MultiVectorHnsw::save`] and
//! [`MultiVectorHnsw::load`].
//!
//! ```
//! use multivec::distance::{Cosine, SquaredEuclidean, WeightedAverageDistance};
//! use multivec::{MultiVectorHnsw, Vector};
//!
//! # fn main() -> multivec::Result<()> {
//! let distance = WeightedAverageDistance::builder()
//!     .add(SquaredEuclidean, 0.7)
//!     .add(Cosine, 0.3)
//!     .build()?;
//! let index = MultiVectorHnsw::builder()
//!     .m(16)
//!     .ef_construction(200)
//!     .distance(distance)
//!     .build()?;
//!
//! index.add(1, vec![Vector::new(vec![0.1, 0.2])?, Vector::new(vec![0.9, 0.1])?])?;
//! index.add(2, vec![Vector::new(vec![0.8, 0.7])?, Vector::new(vec![0.2, 0.3])?])?;
//!
//! let query = vec![Vector::new(vec![0.1, 0.25])?, Vector::new(vec![0.85, 0.1])?];
//! let hits = index.search(&query, 1)?;
//! assert_eq!(hits[0].id, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod distance;
pub mod error;
pub mod index;
mod persistence;
pub mod vector;

pub use error::{Error, Result};
pub use index::{HnswBuilder, HnswConfig, MultiVectorHnsw, SearchResult};
pub use vector::Vector;
