//! Tree layout and construction.

use crate::metric::Metric;
use crate::{Result, VpTreeError};

/// A node of the tree, stored in a flat arena.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Index of the vantage point in `VpTree::points`.
    pub(crate) point: usize,
    /// Median distance from the vantage point to its descendants.
    /// Every `inside` descendant is at distance <= radius, every
    /// `outside` descendant at distance >= radius.
    pub(crate) radius: f32,
    pub(crate) inside: Option<usize>,
    pub(crate) outside: Option<usize>,
}

/// Scratch entry used while partitioning.
struct Item {
    index: usize,
    distance: f32,
}

/// Immutable vantage-point tree over points of type `P`.
///
/// Nodes live in a `Vec` arena and reference each other by position, so the
/// structure has no interior pointers and is `Send + Sync` whenever `P` and
/// `M` are.
pub struct VpTree<P, M> {
    pub(crate) points: Vec<P>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) metric: M,
}

impl<P, M: Metric<P>> VpTree<P, M> {
    /// Build a tree over `points` using `metric`.
    ///
    /// Vantage points are chosen deterministically (the first point of each
    /// partition), so the same input always produces the same tree.
    ///
    /// # Errors
    ///
    /// - [`VpTreeError::Empty`] if `points` is empty
    /// - [`VpTreeError::InvalidDistance`] if the metric returns NaN or a
    ///   negative value for any pair measured during construction
    pub fn build(metric: M, points: Vec<P>) -> Result<Self> {
        if points.is_empty() {
            return Err(VpTreeError::Empty);
        }

        let mut items: Vec<Item> = (0..points.len())
            .map(|index| Item {
                index,
                distance: 0.0,
            })
            .collect();

        let mut nodes = Vec::with_capacity(points.len());
        build_subtree(&metric, &points, &mut nodes, &mut items)?;

        Ok(Self {
            points,
            nodes,
            metric,
        })
    }
}

impl<P, M> VpTree<P, M> {
    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false` for a successfully built tree.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in the order they were passed to [`VpTree::build`].
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// The metric the tree was built with.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Height of the tree (a single node has depth 1).
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: Option<usize>) -> usize {
            match id {
                Some(id) => {
                    let node = &nodes[id];
                    1 + walk(nodes, node.inside).max(walk(nodes, node.outside))
                }
                None => 0,
            }
        }
        walk(&self.nodes, self.root())
    }

    pub(crate) fn root(&self) -> Option<usize> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Recursively partition `items` and append the resulting nodes.
///
/// Returns the arena position of the subtree's root, or `None` for an empty
/// partition. Each level halves the partition, so recursion depth is
/// `O(log n)`.
fn build_subtree<P, M: Metric<P>>(
    metric: &M,
    points: &[P],
    nodes: &mut Vec<Node>,
    items: &mut [Item],
) -> Result<Option<usize>> {
    let Some((vantage, rest)) = items.split_first_mut() else {
        return Ok(None);
    };

    let vantage_point = &points[vantage.index];
    for item in rest.iter_mut() {
        let distance = metric.distance(vantage_point, &points[item.index]);
        if distance.is_nan() || distance < 0.0 {
            return Err(VpTreeError::InvalidDistance(distance));
        }
        item.distance = distance;
    }

    let id = nodes.len();
    nodes.push(Node {
        point: vantage.index,
        radius: 0.0,
        inside: None,
        outside: None,
    });

    if rest.is_empty() {
        return Ok(Some(id));
    }

    let median = rest.len() / 2;
    rest.select_nth_unstable_by(median, |a, b| a.distance.total_cmp(&b.distance));
    let radius = rest[median].distance;

    let (inside, outside) = rest.split_at_mut(median);
    let inside = build_subtree(metric, points, nodes, inside)?;
    let outside = build_subtree(metric, points, nodes, outside)?;

    let node = &mut nodes[id];
    node.radius = radius;
    node.inside = inside;
    node.outside = outside;

    Ok(Some(id))
}
