//! Bounded k-nearest search.

use crate::metric::Metric;
use crate::tree::VpTree;
use crate::{Result, VpTreeError};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio_util::sync::CancellationToken;

/// A search hit.
#[derive(Debug)]
pub struct Neighbor<'a, P> {
    /// The matching point.
    pub point: &'a P,
    /// Position of the point in the `Vec` passed to `build`.
    pub index: usize,
    /// Distance from the query.
    pub distance: f32,
}

/// Candidate kept in the result heap, ordered by (distance, index).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    index: usize,
    distance: f32,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// The `limit` best candidates seen so far (max-heap, worst on top).
struct Best {
    heap: BinaryHeap<Candidate>,
    limit: usize,
    max_distance: f32,
}

impl Best {
    /// Current search radius: anything further away cannot enter the results.
    fn tau(&self) -> f32 {
        if self.heap.len() < self.limit {
            self.max_distance
        } else {
            self.heap.peek().map_or(self.max_distance, |worst| worst.distance)
        }
    }

    fn offer(&mut self, candidate: Candidate) {
        if self.heap.len() < self.limit {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }
}

/// Relative tolerance on the triangle inequality. Distances are rounded f32
/// values, so the inequality only holds up to a few ulps per term.
const PRUNE_SLACK: f32 = 1e-4;

#[inline]
fn slack(distance: f32, tau: f32, radius: f32) -> f32 {
    PRUNE_SLACK * (distance + tau + radius)
}

/// Whether the ball of `radius` around a vantage point at `distance` from the
/// query can hold a point within `tau` of it.
#[inline]
fn may_reach_inside(distance: f32, tau: f32, radius: f32) -> bool {
    distance - tau <= radius + slack(distance, tau, radius)
}

/// Whether the shell outside `radius` can hold a point within `tau`.
#[inline]
fn may_reach_outside(distance: f32, tau: f32, radius: f32) -> bool {
    distance + tau + slack(distance, tau, radius) >= radius
}

impl<P, M: Metric<P>> VpTree<P, M> {
    /// Find up to `limit` points nearest to `query`.
    ///
    /// Only points for which `predicate` returns `true` and whose distance to
    /// `query` is at most `max_distance` are returned. Results are sorted by
    /// ascending distance; equal distances are ordered by the point's position
    /// in the input to [`VpTree::build`]. Filtered points are still traversed,
    /// so a restrictive predicate costs extra node visits, not correctness.
    ///
    /// # Errors
    ///
    /// - [`VpTreeError::Cancelled`] if `cancel` fires before the search
    ///   completes; no partial results are returned
    /// - [`VpTreeError::InvalidDistance`] if the metric yields NaN
    pub fn search<F>(
        &self,
        cancel: &CancellationToken,
        query: &P,
        limit: usize,
        max_distance: f32,
        predicate: F,
    ) -> Result<Vec<Neighbor<'_, P>>>
    where
        F: Fn(&P) -> bool,
    {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut best = Best {
            heap: BinaryHeap::with_capacity(limit.min(self.len())),
            limit,
            max_distance,
        };

        if let Some(root) = self.root() {
            self.visit(root, cancel, query, &predicate, &mut best)?;
        }

        Ok(best
            .heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                point: &self.points[c.index],
                index: c.index,
                distance: c.distance,
            })
            .collect())
    }

    /// Depth-first visit, descending first into the side the query falls on.
    fn visit<F>(
        &self,
        id: usize,
        cancel: &CancellationToken,
        query: &P,
        predicate: &F,
        best: &mut Best,
    ) -> Result<()>
    where
        F: Fn(&P) -> bool,
    {
        if cancel.is_cancelled() {
            return Err(VpTreeError::Cancelled);
        }

        let node = &self.nodes[id];
        let point = &self.points[node.point];
        let distance = self.metric.distance(query, point);
        if distance.is_nan() {
            return Err(VpTreeError::InvalidDistance(distance));
        }

        if distance <= best.tau() && predicate(point) {
            best.offer(Candidate {
                index: node.point,
                distance,
            });
        }

        // Comparisons are non-strict on both sides so equal-distance points
        // with a lower index are never pruned away.
        if distance < node.radius {
            if let Some(inside) = node.inside {
                if may_reach_inside(distance, best.tau(), node.radius) {
                    self.visit(inside, cancel, query, predicate, best)?;
                }
            }
            if let Some(outside) = node.outside {
                if may_reach_outside(distance, best.tau(), node.radius) {
                    self.visit(outside, cancel, query, predicate, best)?;
                }
            }
        } else {
            if let Some(outside) = node.outside {
                if may_reach_outside(distance, best.tau(), node.radius) {
                    self.visit(outside, cancel, query, predicate, best)?;
                }
            }
            if let Some(inside) = node.inside {
                if may_reach_inside(distance, best.tau(), node.radius) {
                    self.visit(inside, cancel, query, predicate, best)?;
                }
            }
        }

        Ok(())
    }
}
