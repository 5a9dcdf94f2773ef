use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading index artifacts or ranking documents
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("invalid frequency in packed metadata: {0}")]
    InvalidFrequency(i64),

    #[error("total document count must be set before ranking")]
    TotalDocumentsUnset,

    #[error("document frequency {document_frequency} exceeds total document count {total}")]
    DocumentFrequencyExceedsTotal { document_frequency: usize, total: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for index and ranking operations
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SearchError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        SearchError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    /// Row-level errors are skipped by loaders; everything else aborts the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SearchError::MalformedRow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::malformed(3, "missing term id");
        assert_eq!(err.to_string(), "malformed row at line 3: missing term id");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(SearchError::malformed(1, "x").is_recoverable());
        assert!(!SearchError::TotalDocumentsUnset.is_recoverable());
        let io = SearchError::io(
            "barrels/barrel_0.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!io.is_recoverable());
    }
}
