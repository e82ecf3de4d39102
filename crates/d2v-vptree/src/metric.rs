//! Distance functions the tree can be built over.

/// A distance function over points of type `P`.
///
/// Implementations must return a non-negative, symmetric value satisfying the
/// triangle inequality. NaN or negative values are rejected during build.
/// Metrics must be `Send + Sync`.
pub trait Metric<P>: Send + Sync {
    /// Distance between `a` and `b`.
    fn distance(&self, a: &P, b: &P) -> f32;
}

impl<P, F> Metric<P> for F
where
    F: Fn(&P, &P) -> f32 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &P, b: &P) -> f32 {
        self(a, b)
    }
}
