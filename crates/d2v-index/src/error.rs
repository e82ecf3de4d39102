use d2v_vptree::VpTreeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Source unavailable: {origin}: {source}")]
    SourceUnavailable {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at line {line}{}: {reason}", column_suffix(.column))]
    MalformedRecord {
        line: u64,
        column: Option<usize>,
        reason: String,
    },

    #[error("Duplicate document id {id:?} at line {line}")]
    DuplicateId { id: String, line: u64 },

    #[error("No document with id {0:?}")]
    DocumentNotFound(String),

    #[error("Search cancelled")]
    SearchCancelled,

    #[error("Search failure: {0}")]
    SearchFailure(VpTreeError),
}

impl From<VpTreeError> for IndexError {
    fn from(err: VpTreeError) -> Self {
        match err {
            VpTreeError::Cancelled => IndexError::SearchCancelled,
            other => IndexError::SearchFailure(other),
        }
    }
}

fn column_suffix(column: &Option<usize>) -> String {
    match column {
        Some(column) => format!(", column {}", column),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message() {
        let err = IndexError::MalformedRecord {
            line: 3,
            column: Some(2),
            reason: "invalid float literal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record at line 3, column 2: invalid float literal"
        );

        let err = IndexError::MalformedRecord {
            line: 7,
            column: None,
            reason: "expected 4 fields, found 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record at line 7: expected 4 fields, found 3"
        );
    }

    #[test]
    fn test_cancellation_maps_to_search_cancelled() {
        let err: IndexError = VpTreeError::Cancelled.into();
        assert!(matches!(err, IndexError::SearchCancelled));

        let err: IndexError = VpTreeError::Empty.into();
        assert!(matches!(err, IndexError::SearchFailure(VpTreeError::Empty)));
    }
}
