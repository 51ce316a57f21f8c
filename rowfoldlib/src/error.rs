//! Error types for rowfoldlib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating or presenting results.
///
/// Grouping, serialization and sorting themselves are total and never fail.
#[derive(Error, Debug)]
pub enum RowfoldError {
    /// Failed to read a results payload from disk
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Payload is not valid JSON or does not have the expected shape
    #[error("invalid results payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Positional row has more cells than the advertised columns
    #[error("row {row} has {found} cells but only {expected} columns are declared")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Key column is not part of the schema (strict mode only)
    #[error("key column '{0}' is not one of the result columns")]
    UnknownKeyColumn(String),

    /// Composite field declaration could not be parsed
    #[error("invalid composite field '{spec}': {message}")]
    InvalidComposite { spec: String, message: String },

    /// Sort requested on a column the table does not have
    #[error("column index {index} is out of range for a table with {len} columns")]
    ColumnOutOfRange { index: usize, len: usize },

    /// Sort requested on a header the table does not have
    #[error("no column labeled '{0}'")]
    UnknownColumn(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
