//! Multi-vector distance aggregation.
//!
//! [`MultiVectorDistance`] folds the per-field distances between two
//! equal-length vector lists into one scalar. The shipped implementation,
//! [`WeightedAverageDistance`], is a normalized weighted average; the trait
//! is open for custom aggregations (max, min, learned combinations), chosen
//! by the caller when the index is built.

use crate::distance::{Distance, MetricKind};
use crate::error::{Error, Result};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Aggregates per-field distances over two equal-length vector lists.
pub trait MultiVectorDistance: Send + Sync {
    /// Aggregated distance between `a` and `b`. Lower is more similar.
    ///
    /// Fails with [`Error::LengthMismatch`] when the lists differ in length.
    fn compute(&self, a: &[Vector], b: &[Vector]) -> Result<f64>;

    /// Number of vectors this aggregator expects per item, when fixed.
    /// Used by the index to validate inputs before mutating anything.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Serializable configuration for snapshots. Custom aggregators report
    /// [`AggregatorSpec::Custom`] and must be resupplied on load.
    fn spec(&self) -> AggregatorSpec {
        AggregatorSpec::Custom
    }
}

/// Snapshot record of an index's aggregator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregatorSpec {
    /// A [`WeightedAverageDistance`] over shipped metrics.
    WeightedAverage {
        metrics: Vec<MetricKind>,
        weights: Vec<f32>,
    },
    /// A user-supplied aggregator that cannot be reconstructed from the
    /// snapshot alone.
    Custom,
}

/// Normalized weighted average of per-field distances.
///
/// Weights are normalized to sum to 1.0 at construction time, so
/// `[1.4, 0.6]` behaves identically to `[0.7, 0.3]`.
pub struct WeightedAverageDistance {
    distances: Vec<Arc<dyn Distance>>,
    weights: Vec<f32>,
}

impl WeightedAverageDistance {
    /// Creates an aggregator from `(distance, weight)` pairs.
    ///
    /// Fails with [`Error::InvalidConfig`] if the list is empty, any weight
    /// is negative, or the weights sum to zero.
    pub fn new(pairs: Vec<(Arc<dyn Distance>, f32)>) -> Result<Self> {
        let (distances, weights) = pairs.into_iter().unzip();
        Self::from_parts(distances, weights)
    }

    /// Creates an aggregator from parallel distance and weight lists.
    pub fn from_parts(distances: Vec<Arc<dyn Distance>>, weights: Vec<f32>) -> Result<Self> {
        if distances.is_empty() {
            return Err(Error::InvalidConfig(
                "weighted average needs at least one distance".to_string(),
            ));
        }
        if distances.len() != weights.len() {
            return Err(Error::InvalidConfig(format!(
                "distance count {} does not match weight count {}",
                distances.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| *w < 0.0) {
            return Err(Error::InvalidConfig(
                "weights cannot be negative".to_string(),
            ));
        }
        let sum: f32 = weights.iter().sum();
        if sum == 0.0 {
            return Err(Error::InvalidConfig(
                "weights cannot sum to zero".to_string(),
            ));
        }
        let weights = weights.into_iter().map(|w| w / sum).collect();
        Ok(Self { distances, weights })
    }

    /// Starts a fluent builder, mirroring index construction chains.
    pub fn builder() -> WeightedAverageBuilder {
        WeightedAverageBuilder::default()
    }

    /// The normalized weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl MultiVectorDistance for WeightedAverageDistance {
    fn compute(&self, a: &[Vector], b: &[Vector]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(Error::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        if a.len() != self.distances.len() {
            return Err(Error::ArityMismatch {
                expected: self.distances.len(),
                actual: a.len(),
            });
        }
        let mut total = 0.0;
        for ((dist, weight), (va, vb)) in self
            .distances
            .iter()
            .zip(self.weights.iter())
            .zip(a.iter().zip(b.iter()))
        {
            total += f64::from(*weight) * dist.compute(va, vb)?;
        }
        Ok(total)
    }

    fn arity(&self) -> Option<usize> {
        Some(self.distances.len())
    }

    fn spec(&self) -> AggregatorSpec {
        let mut metrics = Vec::with_capacity(self.distances.len());
        for dist in &self.distances {
            match dist.kind() {
                Some(kind) => metrics.push(kind),
                None => return AggregatorSpec::Custom,
            }
        }
        AggregatorSpec::WeightedAverage {
            metrics,
            weights: self.weights.clone(),
        }
    }
}

/// Fluent builder for [`WeightedAverageDistance`].
#[derive(Default)]
pub struct WeightedAverageBuilder {
    pairs: Vec<(Arc<dyn Distance>, f32)>,
}

impl WeightedAverageBuilder {
    /// Appends one per-field distance and its weight.
    pub fn add<D: Distance + 'static>(mut self, distance: D, weight: f32) -> Self {
        self.pairs.push((Arc::new(distance), weight));
        self
    }

    /// Appends the pair only when `condition` holds.
    pub fn add_if<D: Distance + 'static>(self, condition: bool, distance: D, weight: f32) -> Self {
        if condition {
            self.add(distance, weight)
        } else {
            self
        }
    }

    /// Validates and builds the aggregator.
    pub fn build(self) -> Result<WeightedAverageDistance> {
        WeightedAverageDistance::new(self.pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{Cosine, SquaredEuclidean};

    fn v(data: &[f32]) -> Vector {
        Vector::from_slice(data).unwrap()
    }

    fn item(fields: &[&[f32]]) -> Vec<Vector> {
        fields.iter().map(|f| v(f)).collect()
    }

    #[test]
    fn test_weighted_average() {
        let agg = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 0.7)
            .add(Cosine, 0.3)
            .build()
            .unwrap();
        let a = item(&[&[1.0, 2.0], &[1.0, 0.0]]);
        let b = item(&[&[4.0, 6.0], &[0.0, 1.0]]);
        // 0.7 * 25.0 + 0.3 * 1.0
        let d = agg.compute(&a, &b).unwrap();
        assert!((d - 17.8).abs() < 1e-4, "expected 17.8, got {d}");
    }

    #[test]
    fn test_weight_normalization() {
        let raw = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 1.4)
            .add(Cosine, 0.6)
            .build()
            .unwrap();
        let normalized = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 0.7)
            .add(Cosine, 0.3)
            .build()
            .unwrap();
        let a = item(&[&[1.0, 2.0], &[1.0, 0.0]]);
        let b = item(&[&[4.0, 6.0], &[0.0, 1.0]]);
        let d1 = raw.compute(&a, &b).unwrap();
        let d2 = normalized.compute(&a, &b).unwrap();
        assert!((d1 - d2).abs() < 1e-9, "{d1} vs {d2}");
    }

    #[test]
    fn test_empty_config_rejected() {
        assert!(matches!(
            WeightedAverageDistance::new(Vec::new()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let err = WeightedAverageDistance::from_parts(
            vec![Arc::new(SquaredEuclidean)],
            vec![0.5, 0.5],
        );
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 0.5)
            .add(Cosine, -0.1)
            .build();
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_sum_rejected() {
        let err = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 0.0)
            .add(Cosine, 0.0)
            .build();
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_length_mismatch() {
        let agg = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 1.0)
            .build()
            .unwrap();
        let a = item(&[&[1.0]]);
        let b = item(&[&[1.0], &[2.0]]);
        assert!(matches!(
            agg.compute(&a, &b),
            Err(Error::LengthMismatch { left: 1, right: 2 })
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let agg = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 0.5)
            .add(Cosine, 0.5)
            .build()
            .unwrap();
        let a = item(&[&[1.0]]);
        let b = item(&[&[2.0]]);
        assert!(matches!(
            agg.compute(&a, &b),
            Err(Error::ArityMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_add_if() {
        let agg = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 1.0)
            .add_if(false, Cosine, 1.0)
            .build()
            .unwrap();
        assert_eq!(agg.arity(), Some(1));
    }

    #[test]
    fn test_spec_round_trip() {
        let agg = WeightedAverageDistance::builder()
            .add(SquaredEuclidean, 0.7)
            .add(Cosine, 0.3)
            .build()
            .unwrap();
        match agg.spec() {
            AggregatorSpec::WeightedAverage { metrics, weights } => {
                assert_eq!(
                    metrics,
                    vec![MetricKind::SquaredEuclidean, MetricKind::Cosine]
                );
                assert_eq!(weights, vec![0.7, 0.3]);
            }
            AggregatorSpec::Custom => panic!("shipped metrics must serialize"),
        }
    }

    #[test]
    fn test_custom_distance_spec_is_custom() {
        struct Manhattan;
        impl Distance for Manhattan {
            fn compute(&self, a: &Vector, b: &Vector) -> Result<f64> {
                Ok(a.as_slice()
                    .iter()
                    .zip(b.as_slice())
                    .map(|(x, y)| f64::from(*x - *y).abs())
                    .sum())
            }
            fn name(&self) -> &'static str {
                "Manhattan"
            }
        }
        let agg = WeightedAverageDistance::builder()
            .add(Manhattan, 1.0)
            .build()
            .unwrap();
        assert_eq!(agg.spec(), AggregatorSpec::Custom);
    }
}
