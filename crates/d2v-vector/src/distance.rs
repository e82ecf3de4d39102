//! Raw distance kernels over `f32` slices.
//!
//! The loops are unrolled by four so release builds auto-vectorize them.
//! Callers are responsible for passing slices of equal length; this is only
//! checked with `debug_assert!`.

/// Euclidean (L2) distance: `sqrt(sum((a[i] - b[i])^2))`.
///
/// # Example
///
/// ```
/// use d2v_vector::euclidean_distance;
///
/// let d = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]);
/// assert!((d - 5.0).abs() < 1e-6);
/// ```
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Squared Euclidean distance. Preserves ordering, skips the `sqrt`.
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut sum = 0.0f32;
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let (a_rest, b_rest) = (a_chunks.remainder(), b_chunks.remainder());

    for (x, y) in a_chunks.zip(b_chunks) {
        let d0 = x[0] - y[0];
        let d1 = x[1] - y[1];
        let d2 = x[2] - y[2];
        let d3 = x[3] - y[3];
        sum += d0 * d0 + d1 * d1 + d2 * d2 + d3 * d3;
    }

    for (x, y) in a_rest.iter().zip(b_rest) {
        let d = x - y;
        sum += d * d;
    }

    sum
}

/// Inner (dot) product: `sum(a[i] * b[i])`.
///
/// For unit vectors this is the cosine similarity.
#[inline]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let mut sum = 0.0f32;
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let (a_rest, b_rest) = (a_chunks.remainder(), b_chunks.remainder());

    for (x, y) in a_chunks.zip(b_chunks) {
        sum += x[0] * y[0] + x[1] * y[1] + x[2] * y[2] + x[3] * y[3];
    }

    for (x, y) in a_rest.iter().zip(b_rest) {
        sum += x * y;
    }

    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0, 0.0, 0.0];
        let b = [3.0, 4.0, 0.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 0.001);

        let c = [1.0, 2.0, 3.0];
        assert_eq!(euclidean_distance(&c, &c), 0.0);
    }

    #[test]
    fn test_euclidean_distance_squared() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((euclidean_distance_squared(&a, &b) - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_inner_product() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert!((inner_product(&a, &b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_remainder_lanes_are_counted() {
        // 6 dims: one full chunk of 4 plus a remainder of 2.
        let a = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let b = [0.0, 0.0, 0.0, 0.0, 0.0, 3.0];
        assert!((euclidean_distance_squared(&a, &b) - 9.0).abs() < 0.001);
        assert!((inner_product(&a, &b) - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_high_dimensional() {
        let a: Vec<f32> = (0..300).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..300).map(|i| (i + 1) as f32).collect();

        let d = euclidean_distance(&a, &b);
        assert!((d - (300.0f32).sqrt()).abs() < 0.01);
    }
}
