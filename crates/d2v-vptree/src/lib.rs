//! Vantage-point tree for exact nearest-neighbour search.
//!
//! A VP-tree recursively picks a *vantage* point, measures every remaining
//! point against it and splits them at the median distance: points no further
//! than the median go `inside`, the rest go `outside`. At query time the
//! triangle inequality lets whole subtrees be skipped.
//!
//! The tree is generic over the point type `P` and a [`Metric`]. Any closure
//! `Fn(&P, &P) -> f32` is a metric, as is any type implementing the trait.
//! The metric must be a true metric (non-negative, symmetric, triangle
//! inequality) or pruning may drop valid results.
//!
//! Trees are built once from a complete point set and are immutable
//! afterwards, so a `&VpTree` can be searched from many threads at once.
//!
//! # Search semantics
//!
//! [`VpTree::search`] returns up to `limit` points in ascending distance order,
//! keeping only points that pass a caller predicate and lie within
//! `max_distance`. Equal distances are ordered by the point's position in the
//! `Vec` handed to [`VpTree::build`], so results are reproducible. The search
//! polls a [`CancellationToken`](tokio_util::sync::CancellationToken) at every
//! node and aborts with [`VpTreeError::Cancelled`] once it fires.
//!
//! # Example
//!
//! ```
//! use d2v_vptree::VpTree;
//! use tokio_util::sync::CancellationToken;
//!
//! let points = vec![0.0f32, 1.0, 5.0, 9.0, 10.0];
//! let tree = VpTree::build(|a: &f32, b: &f32| (a - b).abs(), points).unwrap();
//!
//! let cancel = CancellationToken::new();
//! let near = tree.search(&cancel, &4.0, 2, f32::INFINITY, |_| true).unwrap();
//!
//! let found: Vec<f32> = near.iter().map(|n| *n.point).collect();
//! assert_eq!(found, vec![5.0, 1.0]);
//! ```

mod metric;
mod search;
mod tree;

pub use metric::Metric;
pub use search::Neighbor;
pub use tree::VpTree;

/// Error type for VP-tree operations.
#[derive(Debug, thiserror::Error)]
pub enum VpTreeError {
    #[error("Cannot build a tree from zero points")]
    Empty,

    #[error("Metric returned an invalid distance: {0}")]
    InvalidDistance(f32),

    #[error("Search cancelled")]
    Cancelled,
}

/// Result type for VP-tree operations.
pub type Result<T> = std::result::Result<T, VpTreeError>;
