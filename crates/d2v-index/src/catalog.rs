//! Document catalog: id -> normalized vector.
//!
//! The catalog is loaded once from a headerless CSV source where each row is
//! `id,v1,v2,...,vD`. Loading is all-or-nothing: the first bad row aborts it.

use crate::error::{IndexError, Result};
use crate::options::{DuplicatePolicy, LoadOptions};
use d2v_vector::Normalized;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// A document id (reference into an external record store) and its
/// normalized embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    vector: Normalized,
}

impl Document {
    pub fn new(id: impl Into<String>, vector: Normalized) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vector(&self) -> &Normalized {
        &self.vector
    }
}

/// Immutable mapping from document id to [`Document`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    docs: HashMap<String, Arc<Document>>,
    dimensions: Option<usize>,
}

impl Catalog {
    /// Load a catalog from the CSV file at `path`.
    ///
    /// # Errors
    ///
    /// [`IndexError::SourceUnavailable`] if the file cannot be opened or read,
    /// plus everything [`Catalog::load`] can return.
    pub fn open(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| IndexError::SourceUnavailable {
            origin: origin.clone(),
            source,
        })?;

        load_csv(file, &origin, options)
    }

    /// Load a catalog from CSV text read from `reader`.
    ///
    /// Fields after the id are parsed as `f32` and normalized to unit length.
    ///
    /// # Errors
    ///
    /// - [`IndexError::MalformedRecord`] for a non-numeric component, a row
    ///   without vector components, a row whose field count differs from the
    ///   first row, a zero or non-finite vector, or invalid UTF-8
    /// - [`IndexError::DuplicateId`] for a repeated id under
    ///   [`DuplicatePolicy::Reject`]
    /// - [`IndexError::SourceUnavailable`] if reading fails
    pub fn load<R: Read>(reader: R, options: &LoadOptions) -> Result<Self> {
        load_csv(reader, "<reader>", options)
    }

    /// Build a catalog from already-normalized documents.
    ///
    /// Duplicate handling follows `options`; the `line` reported in errors is
    /// the 1-based position in `docs`.
    pub fn from_documents(
        docs: impl IntoIterator<Item = Document>,
        options: &LoadOptions,
    ) -> Result<Self> {
        let mut builder = CatalogBuilder::new(options.duplicates);
        for (i, doc) in docs.into_iter().enumerate() {
            builder.insert(doc, i as u64 + 1)?;
        }
        Ok(builder.finish())
    }

    /// Look up a document by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Document>> {
        self.docs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }

    /// Every document, sorted by ascending id.
    pub fn all(&self) -> Vec<Arc<Document>> {
        let mut docs: Vec<Arc<Document>> = self.docs.values().cloned().collect();
        docs.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Shared vector dimensionality, `None` for an empty catalog.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

/// Accumulates documents while enforcing id and dimension rules.
struct CatalogBuilder {
    docs: HashMap<String, Arc<Document>>,
    dimensions: Option<usize>,
    duplicates: DuplicatePolicy,
}

impl CatalogBuilder {
    fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            docs: HashMap::new(),
            dimensions: None,
            duplicates,
        }
    }

    fn insert(&mut self, doc: Document, line: u64) -> Result<()> {
        let dims = doc.vector.dimensions();
        match self.dimensions {
            None => self.dimensions = Some(dims),
            Some(expected) if expected != dims => {
                return Err(IndexError::MalformedRecord {
                    line,
                    column: None,
                    reason: format!("expected {} vector components, found {}", expected, dims),
                });
            }
            Some(_) => {}
        }

        if self.docs.contains_key(&doc.id) {
            match self.duplicates {
                DuplicatePolicy::Reject => {
                    return Err(IndexError::DuplicateId { id: doc.id, line });
                }
                DuplicatePolicy::LastWins => {
                    tracing::warn!(id = %doc.id, line, "Duplicate document id, keeping last");
                }
            }
        }

        self.docs.insert(doc.id.clone(), Arc::new(doc));
        Ok(())
    }

    fn finish(self) -> Catalog {
        Catalog {
            docs: self.docs,
            dimensions: self.dimensions,
        }
    }
}

fn load_csv<R: Read>(reader: R, origin: &str, options: &LoadOptions) -> Result<Catalog> {
    let start = Instant::now();

    // Field counts are checked below so the error can name the expected width.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut builder = CatalogBuilder::new(options.duplicates);
    let mut record = csv::StringRecord::new();
    let mut raw: Vec<f32> = Vec::new();

    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => return Err(csv_error(err, origin)),
        }

        let line = record.position().map_or(0, |pos| pos.line());
        let doc = parse_record(&record, line, &mut raw)?;
        builder.insert(doc, line)?;
    }

    let catalog = builder.finish();

    tracing::info!(
        origin,
        documents = catalog.len(),
        dimensions = catalog.dimensions().unwrap_or(0),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded document catalog"
    );

    Ok(catalog)
}

/// Parse one `id,v1,...,vD` row. `raw` is scratch space reused across rows.
fn parse_record(record: &csv::StringRecord, line: u64, raw: &mut Vec<f32>) -> Result<Document> {
    let mut fields = record.iter();
    let id = fields.next().unwrap_or_default();

    raw.clear();
    for (i, field) in fields.enumerate() {
        let value = field
            .parse::<f32>()
            .map_err(|e| IndexError::MalformedRecord {
                line,
                // 1-based, counting the id column.
                column: Some(i + 2),
                reason: format!("invalid vector component {:?}: {}", field, e),
            })?;
        raw.push(value);
    }

    if raw.is_empty() {
        return Err(IndexError::MalformedRecord {
            line,
            column: None,
            reason: format!("document {:?} has no vector components", id),
        });
    }

    let vector = Normalized::new(raw.as_slice()).map_err(|e| IndexError::MalformedRecord {
        line,
        column: None,
        reason: format!("document {:?}: {}", id, e),
    })?;

    Ok(Document::new(id, vector))
}

fn csv_error(err: csv::Error, origin: &str) -> IndexError {
    let line = err.position().map_or(0, |pos| pos.line());
    let reason = err.to_string();

    match err.into_kind() {
        csv::ErrorKind::Io(source) => IndexError::SourceUnavailable {
            origin: origin.to_string(),
            source,
        },
        csv::ErrorKind::Utf8 { err, .. } => IndexError::MalformedRecord {
            line,
            column: Some(err.field() + 1),
            reason,
        },
        _ => IndexError::MalformedRecord {
            line,
            column: None,
            reason,
        },
    }
}
