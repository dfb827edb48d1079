//! Mapped datasets loaded from delimited sources.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rowport_map::{RawRow, RowMapper};
use rowport_model::{CellValue, MappedRecord, RuleTree};
use tracing::{debug, info, info_span};

use crate::error::{IngestError, Result};
use crate::options::ImportOptions;
use crate::reader::read_rows;

/// Result of a column query.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSlice<'a> {
    /// One row's value, `None` when that row lacks the column.
    Cell(Option<&'a CellValue>),
    /// The column across all rows that have it, in row order.
    Series(Vec<&'a CellValue>),
}

/// The mapped rows of one source, in source order.
#[derive(Debug, Clone, Default)]
pub struct ImportDataset {
    source: PathBuf,
    tree: RuleTree,
    records: Vec<MappedRecord>,
}

impl ImportDataset {
    /// Load `path` with the mapper derived from `options`.
    pub fn load(path: &Path, options: &ImportOptions, tree: RuleTree) -> Result<Self> {
        Self::load_with(path, options, tree, &options.row_mapper())
    }

    /// Load `path`, mapping each row at or after `start_row` with `mapper`.
    ///
    /// `options.trim_cells` is ignored here; the mapper's resolver decides.
    pub fn load_with(
        path: &Path,
        options: &ImportOptions,
        tree: RuleTree,
        mapper: &RowMapper,
    ) -> Result<Self> {
        let span = info_span!("load_source", source = %path.display());
        let _guard = span.enter();

        if !path.exists() {
            return Err(IngestError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let first_row = options.start_row.max(1);
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, cells) in read_rows(path, &options.delimiter)?.enumerate() {
            let cells = cells?;
            let row_number = index + 1;
            if row_number < first_row {
                skipped += 1;
                continue;
            }
            let raw = RawRow::from_cells(cells, options.empty_cells);
            let record = mapper.map_row(&tree, &raw);
            debug!(row = row_number, columns = record.len(), "mapped row");
            records.push(record);
        }

        info!(
            rows = records.len(),
            skipped,
            duration_ms = start.elapsed().as_millis() as u64,
            "source loaded"
        );

        Ok(Self {
            source: path.to_path_buf(),
            tree,
            records,
        })
    }

    /// Build a dataset from records mapped elsewhere.
    pub fn from_records(
        source: impl Into<PathBuf>,
        tree: RuleTree,
        records: Vec<MappedRecord>,
    ) -> Self {
        Self {
            source: source.into(),
            tree,
            records,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source, used to derive session keys.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn tree(&self) -> &RuleTree {
        &self.tree
    }

    pub fn all(&self) -> &[MappedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&MappedRecord> {
        self.records.get(index)
    }

    /// Query one column, for a single row or across the dataset.
    pub fn column(&self, name: &str, row: Option<usize>) -> Result<ColumnSlice<'_>> {
        match row {
            Some(index) => self.cell(name, index).map(ColumnSlice::Cell),
            None if self.records.is_empty() => Err(IngestError::EmptyDataset),
            None => Ok(ColumnSlice::Series(
                self.records
                    .iter()
                    .filter_map(|record| record.get(name))
                    .collect(),
            )),
        }
    }

    /// The value of `name` in row `index`.
    pub fn cell(&self, name: &str, index: usize) -> Result<Option<&CellValue>> {
        let record = self.records.get(index).ok_or(IngestError::EmptyDataset)?;
        Ok(record.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImportDataset {
        let tree = RuleTree::new().direct("name", 1).direct("price", 2);
        let records = vec![
            MappedRecord::from_iter([
                ("name", CellValue::from("Desk")),
                ("price", CellValue::from("120")),
            ]),
            MappedRecord::from_iter([("name", CellValue::from("Lamp"))]),
        ];
        ImportDataset::from_records("products.csv", tree, records)
    }

    #[test]
    fn test_series_omits_rows_without_column() {
        let dataset = sample();
        let slice = dataset.column("price", None).unwrap();
        assert_eq!(slice, ColumnSlice::Series(vec![&CellValue::from("120")]));
    }

    #[test]
    fn test_cell_lookup() {
        let dataset = sample();
        assert_eq!(
            dataset.cell("name", 1).unwrap(),
            Some(&CellValue::from("Lamp"))
        );
        assert_eq!(dataset.cell("price", 1).unwrap(), None);
    }

    #[test]
    fn test_row_past_end_is_empty_dataset() {
        let dataset = sample();
        assert!(matches!(
            dataset.cell("name", 2),
            Err(IngestError::EmptyDataset)
        ));
    }

    #[test]
    fn test_empty_dataset_queries_fail() {
        let dataset = ImportDataset::default();
        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.column("name", None),
            Err(IngestError::EmptyDataset)
        ));
    }

    #[test]
    fn test_source_name() {
        let dataset = ImportDataset::from_records(
            PathBuf::from("/srv/imports/Spring Catalog.csv"),
            RuleTree::new(),
            Vec::new(),
        );
        assert_eq!(dataset.source_name(), "Spring Catalog.csv");
    }
}
