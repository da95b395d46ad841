//! The immutable fixed-length vector type.
//!
//! A [`Vector`] is created once and never mutated. Its L2 norm is computed
//! lazily on first use and memoized in a [`OnceLock`], so concurrent first
//! reads may race to compute but converge to the same value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// An immutable sequence of 32-bit floats with a cached L2 norm.
///
/// Construction from an empty slice fails; every other operation is
/// infallible except those combining two vectors of different lengths,
/// which report [`Error::DimensionMismatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    data: Box<[f32]>,
    #[serde(skip)]
    norm: OnceLock<f64>,
}

impl Vector {
    /// Creates a vector from its components. Fails if `data` is empty.
    pub fn new(data: Vec<f32>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidArgument(
                "vector data cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            data: data.into_boxed_slice(),
            norm: OnceLock::new(),
        })
    }

    /// Creates a vector by copying a slice. Fails if `data` is empty.
    pub fn from_slice(data: &[f32]) -> Result<Self> {
        Self::new(data.to_vec())
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`: empty vectors cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Component at `i`, or `None` if out of bounds.
    pub fn get(&self, i: usize) -> Option<f32> {
        self.data.get(i).copied()
    }

    /// The components as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Copies the components into a new `Vec`.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.to_vec()
    }

    /// Elementwise sum. Fails if the lengths differ.
    pub fn add(&self, other: &Vector) -> Result<Vector> {
        self.check_len(other)?;
        let data: Vec<f32> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Vector::new(data)
    }

    /// Elementwise product. Fails if the lengths differ.
    pub fn mul(&self, other: &Vector) -> Result<Vector> {
        self.check_len(other)?;
        let data: Vec<f32> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .collect();
        Vector::new(data)
    }

    /// Dot product, accumulated in double precision.
    pub fn dot(&self, other: &Vector) -> Result<f64> {
        self.check_len(other)?;
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| f64::from(*a) * f64::from(*b))
            .sum())
    }

    /// L2 norm, computed once and cached for the lifetime of the vector.
    pub fn norm(&self) -> f64 {
        *self.norm.get_or_init(|| {
            self.data
                .iter()
                .map(|v| f64::from(*v) * f64::from(*v))
                .sum::<f64>()
                .sqrt()
        })
    }

    /// Cosine similarity. Returns `0.0` when either norm is exactly zero
    /// (the conventional value for the zero vector, not a failure).
    pub fn cosine(&self, other: &Vector) -> Result<f64> {
        let dot = self.dot(other)?;
        let norms = self.norm() * other.norm();
        if norms == 0.0 {
            return Ok(0.0);
        }
        Ok(dot / norms)
    }

    fn check_len(&self, other: &Vector) -> Result<()> {
        if self.data.len() != other.data.len() {
            return Err(Error::DimensionMismatch {
                left: self.data.len(),
                right: other.data.len(),
            });
        }
        Ok(())
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl TryFrom<Vec<f32>> for Vector {
    type Error = Error;

    fn try_from(data: Vec<f32>) -> Result<Self> {
        Vector::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(data: &[f32]) -> Vector {
        Vector::from_slice(data).unwrap()
    }

    #[test]
    fn test_empty_vector_rejected() {
        assert!(matches!(
            Vector::new(Vec::new()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Vector::from_slice(&[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_len_and_get() {
        let a = v(&[1.0, 2.0, 3.0]);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(1), Some(2.0));
        assert_eq!(a.get(3), None);
    }

    #[test]
    fn test_add_and_mul() {
        let a = v(&[1.0, 2.0]);
        let b = v(&[3.0, 4.0]);
        assert_eq!(a.add(&b).unwrap(), v(&[4.0, 6.0]));
        assert_eq!(a.mul(&b).unwrap(), v(&[3.0, 8.0]));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = v(&[1.0, 2.0]);
        let b = v(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            a.add(&b),
            Err(Error::DimensionMismatch { left: 2, right: 3 })
        ));
        assert!(a.mul(&b).is_err());
        assert!(a.dot(&b).is_err());
    }

    #[test]
    fn test_dot() {
        let a = v(&[1.0, 2.0, 3.0]);
        let b = v(&[4.0, 5.0, 6.0]);
        assert_eq!(a.dot(&b).unwrap(), 32.0);
    }

    #[test]
    fn test_norm_cached() {
        let a = v(&[3.0, 4.0]);
        assert_eq!(a.norm(), 5.0);
        // Second call returns the memoized value
        assert_eq!(a.norm(), 5.0);
    }

    #[test]
    fn test_cosine_zero_vector_convention() {
        let zero = v(&[0.0, 0.0]);
        let a = v(&[1.0, 2.0]);
        assert_eq!(zero.cosine(&a).unwrap(), 0.0);
        assert_eq!(a.cosine(&zero).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = v(&[1.0, 0.0]);
        let b = v(&[0.0, 1.0]);
        assert_eq!(a.cosine(&b).unwrap(), 0.0);
        let c = v(&[2.0, 0.0]);
        assert!((a.cosine(&c).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_norm_concurrent_first_read() {
        let a = std::sync::Arc::new(v(&[1.0; 256]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let a = std::sync::Arc::clone(&a);
                std::thread::spawn(move || a.norm())
            })
            .collect();
        let norms: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for n in &norms {
            assert_eq!(*n, 16.0);
        }
    }
}
