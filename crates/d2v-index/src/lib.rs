//! Nearest-neighbour lookup over doc2vec document vectors.
//!
//! Embeddings are trained offline and delivered as a headerless CSV file with
//! one `id,v1,...,vD` row per document. This crate loads them into a
//! [`Catalog`], normalizes every vector to unit length and builds a
//! vantage-point tree keyed by Euclidean distance. For unit vectors that
//! distance is monotone in cosine similarity, so the nearest documents are the
//! most similar ones.
//!
//! ```text
//! CSV rows -> (id, raw vector) -> Normalized -> Catalog
//!                                                 |
//!                                   sorted by id  v
//!                                              VpTree
//! nearest(id) -> Catalog lookup -> VpTree search -> ids[offset..offset+size]
//! ```
//!
//! # Example
//!
//! ```
//! use d2v_index::{DocumentIndex, LoadOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let csv = "A,1,0\nB,0.9,0.1\nC,-1,0\n";
//! let index = DocumentIndex::from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
//!
//! let cancel = CancellationToken::new();
//! let ids = index.nearest(&cancel, "A", 0, 2, &["A"]).unwrap();
//! assert_eq!(ids, vec!["B", "C"]);
//! ```

mod catalog;
mod error;
mod index;
mod options;

pub use catalog::{Catalog, Document};
pub use error::{IndexError, Result};
pub use index::{DocumentDistance, DocumentIndex};
pub use options::{DuplicatePolicy, LoadOptions};
