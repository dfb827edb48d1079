//! Raw rows as seen by the resolver.

use serde::{Deserialize, Serialize};

/// How empty cells affect column addressing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCellPolicy {
    /// Drop empty cells before indexing; later cells shift left.
    ///
    /// Rows with different empty-cell patterns address different logical
    /// columns under the same rule tree.
    #[default]
    Compact,
    /// Empty cells read as absent but keep their position.
    KeepPositions,
}

/// One source row, addressed with 1-based column indices.
///
/// Index 0 is a sentinel that always reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<Option<String>>,
}

impl RawRow {
    /// Build a row from reader cells.
    pub fn from_cells<I, S>(cells: I, policy: EmptyCellPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = vec![None];
        for cell in cells {
            let cell: String = cell.into();
            match (cell.is_empty(), policy) {
                (true, EmptyCellPolicy::Compact) => {}
                (true, EmptyCellPolicy::KeepPositions) => out.push(None),
                (false, _) => out.push(Some(cell)),
            }
        }
        Self { cells: out }
    }

    /// The cell at `index`, or `None` when absent or out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(Option::as_deref)
    }

    /// Number of addressable positions, including the sentinel.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the row has no cells besides the sentinel.
    pub fn is_empty(&self) -> bool {
        self.cells.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_makes_columns_one_based() {
        let row = RawRow::from_cells(["a", "b"], EmptyCellPolicy::Compact);
        assert_eq!(row.get(0), None);
        assert_eq!(row.get(1), Some("a"));
        assert_eq!(row.get(2), Some("b"));
        assert_eq!(row.get(3), None);
    }

    #[test]
    fn test_compact_shifts_after_empty_cells() {
        let row = RawRow::from_cells(["", "b", "", "d"], EmptyCellPolicy::Compact);
        assert_eq!(row.get(1), Some("b"));
        assert_eq!(row.get(2), Some("d"));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_keep_positions() {
        let row = RawRow::from_cells(["", "b", "", "d"], EmptyCellPolicy::KeepPositions);
        assert_eq!(row.get(1), None);
        assert_eq!(row.get(2), Some("b"));
        assert_eq!(row.get(3), None);
        assert_eq!(row.get(4), Some("d"));
    }

    #[test]
    fn test_whitespace_cells_are_not_empty() {
        let row = RawRow::from_cells(["  ", "x"], EmptyCellPolicy::Compact);
        assert_eq!(row.get(1), Some("  "));
        assert_eq!(row.get(2), Some("x"));
    }

    #[test]
    fn test_empty_row() {
        let row = RawRow::from_cells(Vec::<String>::new(), EmptyCellPolicy::Compact);
        assert!(row.is_empty());
        assert_eq!(row.get(1), None);
    }
}
