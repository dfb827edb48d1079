//! Row mapping: a whole rule tree against one raw row.

use rowport_model::{MappedRecord, RuleTree};
use tracing::trace;

use crate::filter::CellFilter;
use crate::resolver::{CellResolver, ResolveContext};
use crate::raw::RawRow;

/// Drives the [`CellResolver`] over every rule-tree entry of a row.
#[derive(Debug, Default)]
pub struct RowMapper {
    resolver: CellResolver,
}

impl RowMapper {
    pub fn new(resolver: CellResolver) -> Self {
        Self { resolver }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.resolver = self.resolver.with_trim(trim);
        self
    }

    pub fn with_filter(mut self, filter: impl CellFilter + 'static) -> Self {
        self.resolver = self.resolver.with_filter(filter);
        self
    }

    pub fn resolver(&self) -> &CellResolver {
        &self.resolver
    }

    /// Map one row. Keys follow the tree's insertion order; composite
    /// columns without sources are left out.
    pub fn map_row(&self, tree: &RuleTree, row: &RawRow) -> MappedRecord {
        let mut record = MappedRecord::new();
        for (column, rule) in tree.iter() {
            match self
                .resolver
                .resolve(column, rule, row, ResolveContext::TopLevel)
            {
                Some(value) => record.insert(column, value),
                None => trace!(column, "skipping composite column without sources"),
            }
        }
        record
    }

    /// Map a sequence of rows lazily.
    pub fn map_rows<'a, I>(
        &'a self,
        tree: &'a RuleTree,
        rows: I,
    ) -> impl Iterator<Item = MappedRecord> + 'a
    where
        I: IntoIterator<Item = RawRow> + 'a,
        I::IntoIter: 'a,
    {
        rows.into_iter().map(move |row| self.map_row(tree, &row))
    }
}
