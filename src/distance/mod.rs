//! Single-field distance metrics.
//!
//! [`Distance`] compares one pair of vectors; the shipped implementations
//! cover squared Euclidean, Euclidean, cosine, and negative dot product.
//! All metrics return a value where **lower is better** (more similar)
//! and fail with a dimension mismatch when the vector lengths differ.
//! User code can implement [`Distance`] to plug custom metrics into a
//! [`WeightedAverageDistance`](crate::distance::weighted::WeightedAverageDistance).

pub mod weighted;

use crate::error::Result;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use weighted::{AggregatorSpec, MultiVectorDistance, WeightedAverageDistance};

/// A distance function over a single pair of vectors.
pub trait Distance: Send + Sync {
    /// Distance between `a` and `b`. Lower is more similar.
    fn compute(&self, a: &Vector, b: &Vector) -> Result<f64>;

    /// Squared distance. Metrics that are already squared override this to
    /// skip the redundant multiplication.
    fn compute_squared(&self, a: &Vector, b: &Vector) -> Result<f64> {
        self.compute(a, b).map(|d| d * d)
    }

    /// Human-readable metric name.
    fn name(&self) -> &'static str;

    /// Snapshot identity for shipped metrics; `None` for custom ones.
    fn kind(&self) -> Option<MetricKind> {
        None
    }
}

/// Identity of a shipped metric, used to round-trip aggregator
/// configuration through snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Sum of squared component differences. Range: \[0, ∞).
    SquaredEuclidean,
    /// Square root of [`MetricKind::SquaredEuclidean`]. Range: \[0, ∞).
    Euclidean,
    /// `1 - cosine_similarity`. Range: \[0, 2\].
    Cosine,
    /// Negative dot product; not a metric, used for max-inner-product search.
    DotProduct,
}

impl MetricKind {
    /// Instantiates the metric this kind names.
    pub fn metric(self) -> Arc<dyn Distance> {
        match self {
            MetricKind::SquaredEuclidean => Arc::new(SquaredEuclidean),
            MetricKind::Euclidean => Arc::new(Euclidean),
            MetricKind::Cosine => Arc::new(Cosine),
            MetricKind::DotProduct => Arc::new(DotProduct),
        }
    }
}

fn squared_euclidean(a: &Vector, b: &Vector) -> Result<f64> {
    if a.len() != b.len() {
        return Err(crate::error::Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.as_slice()
        .iter()
        .zip(b.as_slice().iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum())
}

/// Squared Euclidean distance: `Σ (aᵢ - bᵢ)²`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl Distance for SquaredEuclidean {
    fn compute(&self, a: &Vector, b: &Vector) -> Result<f64> {
        squared_euclidean(a, b)
    }

    // Already squared; no extra work needed.
    fn compute_squared(&self, a: &Vector, b: &Vector) -> Result<f64> {
        squared_euclidean(a, b)
    }

    fn name(&self) -> &'static str {
        "SquaredEuclidean"
    }

    fn kind(&self) -> Option<MetricKind> {
        Some(MetricKind::SquaredEuclidean)
    }
}

/// Euclidean (L2) distance: `sqrt(Σ (aᵢ - bᵢ)²)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Distance for Euclidean {
    fn compute(&self, a: &Vector, b: &Vector) -> Result<f64> {
        squared_euclidean(a, b).map(f64::sqrt)
    }

    fn compute_squared(&self, a: &Vector, b: &Vector) -> Result<f64> {
        squared_euclidean(a, b)
    }

    fn name(&self) -> &'static str {
        "Euclidean"
    }

    fn kind(&self) -> Option<MetricKind> {
        Some(MetricKind::Euclidean)
    }
}

/// Cosine distance: `1 - cosine_similarity`.
///
/// 0 means identical direction, 1 orthogonal, 2 diametrically opposed.
/// The zero vector has cosine similarity 0 by convention, so its cosine
/// distance to anything is 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Distance for Cosine {
    fn compute(&self, a: &Vector, b: &Vector) -> Result<f64> {
        Ok(1.0 - a.cosine(b)?)
    }

    fn name(&self) -> &'static str {
        "Cosine"
    }

    fn kind(&self) -> Option<MetricKind> {
        Some(MetricKind::Cosine)
    }
}

/// Negative dot product: `-a · b`.
///
/// Not a true metric; vectors with a larger inner product rank closer,
/// which is what maximum-inner-product search wants.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProduct;

impl Distance for DotProduct {
    fn compute(&self, a: &Vector, b: &Vector) -> Result<f64> {
        Ok(-a.dot(b)?)
    }

    fn name(&self) -> &'static str {
        "DotProduct"
    }

    fn kind(&self) -> Option<MetricKind> {
        Some(MetricKind::DotProduct)
    }
}
