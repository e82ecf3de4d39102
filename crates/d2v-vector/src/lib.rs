//! Vector model for doc2vec similarity lookup.
//!
//! Embeddings arrive as raw `f32` vectors from an offline training pipeline.
//! This crate turns them into [`Normalized`] unit vectors and measures them
//! with Euclidean [`distance`]:
//!
//! - **Normalized**: unit-length vector, the only representation the index stores
//! - **distance**: Euclidean distance between unit vectors, monotone in cosine
//!   similarity but still a true metric (which a metric tree requires)
//! - **Kernels**: raw `euclidean_distance`, `euclidean_distance_squared`,
//!   `inner_product` over slices
//!
//! # Example
//!
//! ```
//! use d2v_vector::{distance, Normalized};
//!
//! let a = Normalized::new(&[1.0, 0.0]).unwrap();
//! let b = Normalized::new(&[0.0, 5.0]).unwrap();
//!
//! // Orthogonal unit vectors are sqrt(2) apart.
//! assert!((distance(&a, &b) - std::f32::consts::SQRT_2).abs() < 1e-6);
//! ```

mod distance;
mod normalized;

pub use distance::{euclidean_distance, euclidean_distance_squared, inner_product};
pub use normalized::{distance, Normalized};

/// Error type for vector operations.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("Vector has no components")]
    Empty,

    #[error("Vector has zero magnitude")]
    ZeroMagnitude,

    #[error("Invalid vector: {0}")]
    InvalidVector(String),
}

/// Result type for vector operations.
pub type Result<T> = std::result::Result<T, VectorError>;
