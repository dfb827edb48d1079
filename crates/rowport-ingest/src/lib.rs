//! Delimited source ingestion for rowport.
//!
//! Reads a source row by row, skips rows before the configured start row and
//! maps the rest through a [`RowMapper`](rowport_map::RowMapper) into an
//! [`ImportDataset`].

mod dataset;
mod error;
mod options;
mod reader;

pub use dataset::{ColumnSlice, ImportDataset};
pub use error::{IngestError, Result};
pub use options::{DEFAULT_DELIMITER, ImportOptions};
pub use reader::{SourceRows, delimiter_byte, read_rows};
