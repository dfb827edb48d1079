//! Import error types.
//!
//! Every failure aborts the current operation. [`ImportError`] carries
//! user-facing messages and remediation hints for command-line surfaces.

use std::path::PathBuf;

use rowport_ingest::IngestError;
use rowport_model::ModelError;
use thiserror::Error;

use crate::sink::RecordId;

/// Ledger and flag store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored state could not be encoded or decoded.
    #[error("invalid store data in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Temp file could not be renamed over the target.
    #[error("failed to replace {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Record sink failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("record {0} does not exist")]
    RecordNotFound(RecordId),

    #[error("record kind '{0}' is not registered")]
    UnknownKind(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Rejected(String),
}

/// Import operation error.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Nothing to write.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Forced overwrite against a kind the sink does not know.
    #[error("record kind '{kind}' does not exist")]
    UnknownRecordKind { kind: String },

    /// A previous import exists and no decision was recorded.
    #[error(
        "a previous import of this source exists ({} records under '{key}'); choose cancel, force or continue",
        .previous.len()
    )]
    PendingDecisionRequired { key: String, previous: Vec<RecordId> },

    #[error("record sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("session store failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ImportError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyDataset => "The source has no rows to import.".to_string(),
            Self::UnknownRecordKind { kind } => {
                format!("Records of kind '{kind}' cannot be replaced because that kind is not registered.")
            }
            Self::PendingDecisionRequired { previous, .. } => format!(
                "This source was imported before and created {} records. Decide what happens to them before importing again.",
                previous.len()
            ),
            Self::Sink(err) => format!("The record store rejected the import: {err}"),
            Self::Store(err) => format!("The import session could not be saved or read: {err}"),
            Self::Ingest(IngestError::SourceNotFound { path }) => {
                format!("The source file '{}' could not be found.", path.display())
            }
            Self::Ingest(err) => format!("The source could not be read: {err}"),
            Self::Model(err) => format!("The import profile is invalid: {err}"),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::EmptyDataset => Some("Check the start row and the delimiter.".into()),
            Self::UnknownRecordKind { .. } => {
                Some("Use a registered record kind such as 'post' or 'page'.".into())
            }
            Self::PendingDecisionRequired { .. } => Some(
                "Run again with --decision cancel (forget the previous run), \
                 --decision force (delete its records) or --decision continue (keep them)."
                    .into(),
            ),
            Self::Store(StoreError::AtomicWriteFailed { .. }) => {
                Some("Free up disk space or check permissions on the store directory.".into())
            }
            Self::Ingest(IngestError::InvalidDelimiter { .. }) => {
                Some("Use a single character delimiter such as ';' or ','.".into())
            }
            Self::Ingest(IngestError::UnsupportedEncoding { .. }) => {
                Some("Re-save the source as UTF-8.".into())
            }
            _ => None,
        }
    }
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
