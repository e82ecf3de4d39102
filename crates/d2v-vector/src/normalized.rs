//! Unit-length embedding vectors.

use crate::distance::{euclidean_distance, inner_product};
use crate::{Result, VectorError};

/// An embedding scaled to unit Euclidean length.
///
/// Construction is the only way to obtain a `Normalized`, so every value of
/// this type satisfies `‖v‖₂ ≈ 1`. For two unit vectors the squared Euclidean
/// distance is `2 − 2·cos θ`, which means ranking by [`distance`] is the same
/// as ranking by cosine similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    components: Box<[f32]>,
}

impl Normalized {
    /// Scale `raw` to unit length. `raw` is left untouched.
    ///
    /// # Errors
    ///
    /// - [`VectorError::Empty`] if `raw` has no components
    /// - [`VectorError::InvalidVector`] if any component is NaN or infinite
    /// - [`VectorError::ZeroMagnitude`] if the norm is zero
    ///
    /// # Example
    ///
    /// ```
    /// use d2v_vector::Normalized;
    ///
    /// let v = Normalized::new(&[3.0, 4.0]).unwrap();
    /// assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
    /// assert!((v.as_slice()[1] - 0.8).abs() < 1e-6);
    /// ```
    pub fn new(raw: &[f32]) -> Result<Self> {
        if raw.is_empty() {
            return Err(VectorError::Empty);
        }

        for (i, &v) in raw.iter().enumerate() {
            if !v.is_finite() {
                return Err(VectorError::InvalidVector(format!(
                    "non-finite value {} at index {}",
                    v, i
                )));
            }
        }

        // Accumulate in f64 so long vectors of small components don't lose
        // the norm to rounding.
        let norm = raw
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum::<f64>()
            .sqrt();

        if norm == 0.0 || !norm.is_finite() {
            return Err(VectorError::ZeroMagnitude);
        }

        let components = raw
            .iter()
            .map(|&v| (f64::from(v) / norm) as f32)
            .collect();

        Ok(Self { components })
    }

    /// The unit-length components.
    pub fn as_slice(&self) -> &[f32] {
        &self.components
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.components.len()
    }

    /// Cosine similarity with `other`, in `[-1, 1]`.
    pub fn cosine_similarity(&self, other: &Normalized) -> f32 {
        inner_product(&self.components, &other.components).clamp(-1.0, 1.0)
    }
}

impl AsRef<[f32]> for Normalized {
    fn as_ref(&self) -> &[f32] {
        &self.components
    }
}

/// Euclidean distance between two normalized vectors, in `[0, 2]`.
///
/// Both vectors must have the same dimensionality.
#[inline]
pub fn distance(a: &Normalized, b: &Normalized) -> f32 {
    euclidean_distance(&a.components, &b.components)
}
