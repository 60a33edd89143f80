use crate::metrics::ParseMetricError;
use std::{
    io,
    path::PathBuf,
};

/// Failures reading or writing a series file. A file that does not match its
/// schema is always an error, never silently rewritten.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} has header '{found}', expected '{expected}'", .path.display())]
    HeaderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("{}:{line}: expected {expected} fields, found {found}", .path.display())]
    FieldCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{}:{line}: invalid date '{value}'", .path.display())]
    BadDate { path: PathBuf, line: usize, value: String },
    #[error("{}:{line}: column '{column}': {source}", .path.display())]
    BadValue {
        path: PathBuf,
        line: usize,
        column: String,
        #[source]
        source: ParseMetricError,
    },
}

impl SeriesError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| SeriesError::Io { path, source }
    }
}
