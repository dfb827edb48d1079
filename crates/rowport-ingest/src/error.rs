//! Error types for source ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a source or querying a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source file does not exist.
    #[error("source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Source file exists but could not be opened or read.
    #[error("failed to read source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// A row could not be decoded.
    #[error("failed to parse row {row} of {path}: {message}")]
    CsvParse {
        path: PathBuf,
        row: usize,
        message: String,
    },

    /// Source starts with a UTF-16 byte-order mark.
    #[error("unsupported encoding {encoding} in {path}; save the file as UTF-8")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    /// The configured delimiter is not a single byte.
    #[error("delimiter must be a single byte character, got {delimiter:?}")]
    InvalidDelimiter { delimiter: String },

    // === Dataset Errors ===
    /// Dataset has no rows (nothing was loaded, or the source was empty).
    #[error("dataset is empty or has not been loaded")]
    EmptyDataset,
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
