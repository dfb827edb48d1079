//! Source loading options.

use rowport_map::{CellResolver, EmptyCellPolicy, RowMapper};
use serde::{Deserialize, Serialize};

/// Default field delimiter.
pub const DEFAULT_DELIMITER: &str = ";";

/// How a delimited source is read and turned into raw rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Single-byte field delimiter.
    pub delimiter: String,
    /// First row to map, 1-based. Earlier rows are skipped.
    pub start_row: usize,
    /// Trim whitespace around cell values that are not split.
    pub trim_cells: bool,
    /// How empty cells affect column positions.
    pub empty_cells: EmptyCellPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            start_row: 1,
            trim_cells: false,
            empty_cells: EmptyCellPolicy::default(),
        }
    }
}

impl ImportOptions {
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_start_row(mut self, start_row: usize) -> Self {
        self.start_row = start_row;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim_cells = trim;
        self
    }

    pub fn with_empty_cells(mut self, policy: EmptyCellPolicy) -> Self {
        self.empty_cells = policy;
        self
    }

    /// A mapper honoring `trim_cells`, with the pass-through filter.
    pub fn row_mapper(&self) -> RowMapper {
        RowMapper::new(CellResolver::new().with_trim(self.trim_cells))
    }
}
