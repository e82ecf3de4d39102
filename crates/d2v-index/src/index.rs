//! Document index: catalog + VP-tree, answering paginated neighbour queries.

use crate::catalog::{Catalog, Document};
use crate::error::{IndexError, Result};
use crate::options::LoadOptions;
use d2v_vptree::{Metric, VpTree};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Euclidean distance between the normalized vectors of two documents.
///
/// Minimizing this is equivalent to maximizing cosine similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDistance;

impl Metric<Arc<Document>> for DocumentDistance {
    #[inline]
    fn distance(&self, a: &Arc<Document>, b: &Arc<Document>) -> f32 {
        d2v_vector::distance(a.vector(), b.vector())
    }
}

/// Nearest-neighbour index over doc2vec vectors.
///
/// Built once, then read-only: `nearest` takes `&self` and can be called from
/// any number of threads without locking.
pub struct DocumentIndex {
    catalog: Catalog,
    tree: VpTree<Arc<Document>, DocumentDistance>,
}

impl DocumentIndex {
    /// Load the CSV file at `path` and build the index.
    pub fn open(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        Self::from_catalog(Catalog::open(path, options)?)
    }

    /// Load CSV text from `reader` and build the index.
    pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Self> {
        Self::from_catalog(Catalog::load(reader, options)?)
    }

    /// Build the index over an already loaded catalog.
    ///
    /// Documents are fed to the tree in ascending id order, so documents at
    /// equal distance from a query come back in ascending id order.
    ///
    /// # Errors
    ///
    /// [`IndexError::SearchFailure`] if the tree cannot be built, e.g. for an
    /// empty catalog.
    pub fn from_catalog(catalog: Catalog) -> Result<Self> {
        let start = Instant::now();
        let tree = VpTree::build(DocumentDistance, catalog.all())
            .map_err(IndexError::SearchFailure)?;

        tracing::info!(
            documents = tree.len(),
            depth = tree.depth(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built document index"
        );

        Ok(Self { catalog, tree })
    }

    /// The ids of the documents nearest to document `id`, skipping the first
    /// `offset` and returning at most `size`.
    ///
    /// Results are in ascending distance order. Documents listed in `exclude`
    /// never appear. The query document itself is not excluded automatically;
    /// it is its own nearest neighbour at distance 0, so callers that don't
    /// want it should pass its id in `exclude`.
    ///
    /// An `offset` past the last eligible document, or a `size` of 0, yields
    /// an empty result.
    ///
    /// # Errors
    ///
    /// - [`IndexError::DocumentNotFound`] if `id` is not in the index
    /// - [`IndexError::SearchCancelled`] if `cancel` fires during the search
    /// - [`IndexError::SearchFailure`] for any other search failure
    pub fn nearest(
        &self,
        cancel: &CancellationToken,
        id: &str,
        offset: usize,
        size: usize,
        exclude: &[&str],
    ) -> Result<Vec<String>> {
        let doc = self
            .catalog
            .get(id)
            .ok_or_else(|| IndexError::DocumentNotFound(id.to_string()))?;

        if size == 0 {
            return Ok(Vec::new());
        }

        let excluded: HashSet<&str> = exclude.iter().copied().collect();
        let end = offset.saturating_add(size);
        let limit = end.min(self.tree.len());

        let near = self.tree.search(cancel, doc, limit, f32::INFINITY, |candidate| {
            !excluded.contains(candidate.id())
        })?;

        let start = offset.min(near.len());
        let end = end.min(near.len());

        let ids: Vec<String> = near[start..end]
            .iter()
            .map(|n| n.point.id().to_string())
            .collect();

        tracing::debug!(
            id,
            offset,
            size,
            excluded = excluded.len(),
            returned = ids.len(),
            "Nearest-neighbour query"
        );

        Ok(ids)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Always `false`: an index cannot be built without documents.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Vector dimensionality shared by every document.
    pub fn dimensions(&self) -> usize {
        self.catalog.dimensions().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(text: &str) -> DocumentIndex {
        DocumentIndex::from_reader(text.as_bytes(), &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_unit_circle_scenario() {
        let index = build("A,1,0\nB,0.9,0.1\nC,-1,0\n");
        let cancel = CancellationToken::new();

        let ids = index.nearest(&cancel, "A", 0, 2, &[]).unwrap();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_self_exclusion() {
        let index = build("A,1,0\nB,0.9,0.1\nC,-1,0\n");
        let cancel = CancellationToken::new();

        let ids = index.nearest(&cancel, "A", 0, 2, &["A"]).unwrap();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn test_not_found() {
        let index = build("A,1,0\n");
        let cancel = CancellationToken::new();

        let err = index.nearest(&cancel, "nonexistent-id", 0, 5, &[]).unwrap_err();
        assert!(matches!(err, IndexError::DocumentNotFound(ref id) if id == "nonexistent-id"));
    }

    #[test]
    fn test_size_zero_still_checks_id() {
        let index = build("A,1,0\nB,0,1\n");
        let cancel = CancellationToken::new();

        assert!(index.nearest(&cancel, "A", 0, 0, &[]).unwrap().is_empty());
        assert!(matches!(
            index.nearest(&cancel, "Z", 0, 0, &[]),
            Err(IndexError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_offset_beyond_range() {
        let index = build("A,1,0\nB,0,1\nC,-1,0\n");
        let cancel = CancellationToken::new();

        assert!(index.nearest(&cancel, "A", 3, 5, &[]).unwrap().is_empty());
        assert!(index.nearest(&cancel, "A", usize::MAX, usize::MAX, &[]).unwrap().is_empty());
        assert_eq!(index.nearest(&cancel, "A", 2, 5, &[]).unwrap(), vec!["C"]);
    }

    #[test]
    fn test_equal_distances_order_by_id() {
        // b and c are both orthogonal to a.
        let index = build("c,0,1\na,1,0\nb,0,-1\n");
        let cancel = CancellationToken::new();

        let ids = index.nearest(&cancel, "a", 0, 3, &["a"]).unwrap();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_cancelled() {
        let index = build("A,1,0\nB,0,1\n");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = index.nearest(&cancel, "A", 0, 2, &[]).unwrap_err();
        assert!(matches!(err, IndexError::SearchCancelled));
    }

    #[test]
    fn test_empty_source_fails_to_build() {
        let result = DocumentIndex::from_reader("".as_bytes(), &LoadOptions::default());
        assert!(matches!(result, Err(IndexError::SearchFailure(_))));
    }

    #[test]
    fn test_accessors() {
        let index = build("A,1,0,0\nB,0,1,0\n");
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.dimensions(), 3);
        assert!(index.catalog().contains("B"));
    }
}
