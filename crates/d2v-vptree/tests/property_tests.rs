//! Property tests: VP-tree search must agree with an exhaustive scan.
//!
//! Points are small integer grid coordinates under the Manhattan metric, so
//! every distance is exact in f32 and ties are frequent. A second family uses
//! near-duplicate unit vectors under Euclidean distance, where rounding makes
//! the triangle inequality hold only approximately.

use d2v_vector::{distance, Normalized};
use d2v_vptree::VpTree;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

type Point = (i16, i16);

fn manhattan(a: &Point, b: &Point) -> f32 {
    ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as f32
}

fn arb_point() -> impl Strategy<Value = Point> {
    (-50i16..50, -50i16..50)
}

fn arb_points() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(arb_point(), 1..200)
}

/// Unit vectors built from a few base directions nudged by 1e-7 steps, so
/// computed distances tie or differ only in the last ulps.
fn arb_near_duplicates() -> impl Strategy<Value = Vec<Normalized>> {
    let base = prop::collection::vec(-1.0f32..1.0, 8)
        .prop_filter("non-zero base", |v| v.iter().any(|x| x.abs() > 0.01));

    (
        prop::collection::vec(base, 1..4),
        prop::collection::vec((any::<prop::sample::Index>(), 0u8..4), 2..64),
    )
        .prop_map(|(bases, picks)| {
            picks
                .iter()
                .map(|(which, jitter)| {
                    let raw: Vec<f32> = which
                        .get(&bases)
                        .iter()
                        .enumerate()
                        .map(|(j, x)| x + f32::from(*jitter) * 1e-7 * (j as f32 + 1.0))
                        .collect();
                    Normalized::new(&raw).unwrap()
                })
                .collect()
        })
}

/// Reference answer: sort every eligible point by (distance, index).
fn brute_force(
    points: &[Point],
    query: &Point,
    limit: usize,
    max_distance: f32,
    keep: impl Fn(&Point) -> bool,
) -> Vec<(usize, f32)> {
    let mut all: Vec<(usize, f32)> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| keep(*p))
        .map(|(i, p)| (i, manhattan(query, p)))
        .filter(|(_, d)| *d <= max_distance)
        .collect();
    all.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    all.truncate(limit);
    all
}

proptest! {
    #[test]
    fn test_search_matches_brute_force(
        points in arb_points(),
        query in arb_point(),
        limit in 0usize..50,
    ) {
        let tree = VpTree::build(manhattan, points.clone()).unwrap();
        let cancel = CancellationToken::new();

        let hits: Vec<(usize, f32)> = tree
            .search(&cancel, &query, limit, f32::INFINITY, |_| true)
            .unwrap()
            .iter()
            .map(|n| (n.index, n.distance))
            .collect();

        prop_assert_eq!(hits, brute_force(&points, &query, limit, f32::INFINITY, |_| true));
    }

    #[test]
    fn test_filtered_search_matches_brute_force(
        points in arb_points(),
        query in arb_point(),
        limit in 1usize..50,
        modulus in 2i16..5,
    ) {
        let keep = |p: &Point| p.0.rem_euclid(modulus) != 0;
        let tree = VpTree::build(manhattan, points.clone()).unwrap();
        let cancel = CancellationToken::new();

        let hits: Vec<(usize, f32)> = tree
            .search(&cancel, &query, limit, f32::INFINITY, keep)
            .unwrap()
            .iter()
            .map(|n| (n.index, n.distance))
            .collect();

        prop_assert_eq!(hits, brute_force(&points, &query, limit, f32::INFINITY, keep));
    }

    #[test]
    fn test_radius_search_matches_brute_force(
        points in arb_points(),
        query in arb_point(),
        radius in 0u8..60,
    ) {
        let max_distance = f32::from(radius);
        let tree = VpTree::build(manhattan, points.clone()).unwrap();
        let cancel = CancellationToken::new();

        let hits: Vec<(usize, f32)> = tree
            .search(&cancel, &query, points.len(), max_distance, |_| true)
            .unwrap()
            .iter()
            .map(|n| (n.index, n.distance))
            .collect();

        prop_assert_eq!(
            hits,
            brute_force(&points, &query, points.len(), max_distance, |_| true)
        );
    }

    #[test]
    fn test_near_duplicate_search_matches_brute_force(
        points in arb_near_duplicates(),
        query in any::<prop::sample::Index>(),
        limit in 1usize..64,
    ) {
        let query = points[query.index(points.len())].clone();
        let tree = VpTree::build(distance, points.clone()).unwrap();
        let cancel = CancellationToken::new();

        let hits: Vec<(usize, f32)> = tree
            .search(&cancel, &query, limit, f32::INFINITY, |_| true)
            .unwrap()
            .iter()
            .map(|n| (n.index, n.distance))
            .collect();

        let mut expected: Vec<(usize, f32)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, distance(&query, p)))
            .collect();
        expected.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        expected.truncate(limit);

        prop_assert_eq!(hits, expected);
    }

    #[test]
    fn test_build_is_deterministic(points in arb_points(), query in arb_point()) {
        let a = VpTree::build(manhattan, points.clone()).unwrap();
        let b = VpTree::build(manhattan, points).unwrap();
        let cancel = CancellationToken::new();

        let ha: Vec<usize> = a
            .search(&cancel, &query, 10, f32::INFINITY, |_| true)
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();
        let hb: Vec<usize> = b
            .search(&cancel, &query, 10, f32::INFINITY, |_| true)
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();

        prop_assert_eq!(ha, hb);
        prop_assert_eq!(a.depth(), b.depth());
    }
}
