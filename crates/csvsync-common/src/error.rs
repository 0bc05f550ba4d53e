//! Error types for csvsync table handling

use thiserror::Error;

/// Result type alias for table operations
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors raised while decoding, parsing or writing a CSV table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Decode error: content is not valid UTF-8 ({0})")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No columns to parse from file")]
    NoColumns,

    #[error("Expected {expected} fields in line {line}, saw {actual}")]
    RaggedRow {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Write error: {0}")]
    Write(String),
}
