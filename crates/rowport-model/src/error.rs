//! Error types for the rowport data model.

use thiserror::Error;

/// Errors raised while building or parsing model types.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The rule tree (or one of its entries) has the wrong shape.
    #[error("invalid rule tree: {reason}")]
    Config { reason: String },

    /// JSON input could not be parsed at all.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
