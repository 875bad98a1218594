//! Error types for the debt cleanser.
//!
//! Only configuration and I/O problems surface as errors. Malformed cell
//! values never do: the field parsers degrade them to safe defaults.

use thiserror::Error;

/// Result type alias for cleanser operations
pub type Result<T> = std::result::Result<T, CleanserError>;

/// Errors that can abort a processing run.
#[derive(Error, Debug)]
pub enum CleanserError {
    /// Required mapped columns are absent from the row schema
    #[error("Missing columns in file: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Rule configuration values outside their allowed range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input file type the reader cannot handle
    #[error("Unsupported file format: {0}. Use .csv, .xlsx or .xls")]
    UnsupportedFormat(String),

    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Excel/OpenDocument workbook could not be opened or read
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Configuration JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command line
    #[error("{0}")]
    Usage(String),
}
