//! Resolution of a single column rule against a raw row.

use std::fmt;

use rowport_model::{CellValue, ColumnRule, CompositeRule, RuleSource};

use crate::filter::{CellFilter, PassThrough};
use crate::raw::RawRow;

/// Where a resolution was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveContext {
    /// A rule-tree entry. The cell filter runs on the result.
    TopLevel,
    /// A source feeding a parent composite. The cell filter does not run.
    Nested,
}

/// Resolves [`ColumnRule`]s against [`RawRow`]s.
///
/// The trim flag is fixed at construction and applies to every direct
/// resolution. Split fragments are always trimmed.
pub struct CellResolver {
    trim: bool,
    filter: Box<dyn CellFilter>,
}

impl CellResolver {
    pub fn new() -> Self {
        Self {
            trim: false,
            filter: Box::new(PassThrough),
        }
    }

    /// Trim leading/trailing whitespace from direct cells.
    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Replace the per-cell post-processing hook.
    #[must_use]
    pub fn with_filter(mut self, filter: impl CellFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn trims(&self) -> bool {
        self.trim
    }

    /// Resolve `rule` for `column`.
    ///
    /// Returns `None` for a composite without sources; such columns are
    /// left out of the record.
    pub fn resolve(
        &self,
        column: &str,
        rule: &ColumnRule,
        row: &RawRow,
        context: ResolveContext,
    ) -> Option<CellValue> {
        let value = match rule {
            ColumnRule::Direct(index) => CellValue::Text(self.direct(*index, row)),
            ColumnRule::Composite(composite) => {
                if composite.is_empty() {
                    return None;
                }
                CellValue::List(self.composite(column, composite, row))
            }
        };
        match context {
            ResolveContext::Nested => Some(value),
            ResolveContext::TopLevel => Some(self.post_process(column, value, rule.is_composite())),
        }
    }

    fn direct(&self, index: usize, row: &RawRow) -> String {
        let cell = row.get(index).unwrap_or_default();
        if self.trim {
            cell.trim().to_string()
        } else {
            cell.to_string()
        }
    }

    fn composite(&self, column: &str, rule: &CompositeRule, row: &RawRow) -> Vec<CellValue> {
        let mut values = Vec::new();
        for source in &rule.sources {
            match rule.separator.as_deref() {
                Some(separator) => {
                    for text in self.source_texts(column, source, row) {
                        values.extend(
                            text.split(separator)
                                .map(|fragment| CellValue::Text(fragment.trim().to_string())),
                        );
                    }
                }
                None => values.push(self.nested(column, source, row)),
            }
        }
        values
    }

    /// Raw texts a source contributes to a split composite.
    fn source_texts(&self, column: &str, source: &RuleSource, row: &RawRow) -> Vec<String> {
        match source {
            RuleSource::Index(index) => vec![row.get(*index).unwrap_or_default().to_string()],
            RuleSource::Nested(rule) => match self.resolve(column, rule, row, ResolveContext::Nested)
            {
                Some(value) => value.leaves().into_iter().map(str::to_string).collect(),
                None => vec![String::new()],
            },
        }
    }

    /// The single value a source contributes to an unsplit composite.
    fn nested(&self, column: &str, source: &RuleSource, row: &RawRow) -> CellValue {
        let resolved = match source {
            RuleSource::Index(index) => {
                self.resolve(column, &ColumnRule::Direct(*index), row, ResolveContext::Nested)
            }
            RuleSource::Nested(rule) => self.resolve(column, rule, row, ResolveContext::Nested),
        };
        resolved.unwrap_or_default()
    }

    fn post_process(&self, column: &str, value: CellValue, composite: bool) -> CellValue {
        let filtered = self.filter.filter(column, value.into_list());
        if composite {
            return filtered;
        }
        match filtered {
            CellValue::List(items) => items.into_iter().next().unwrap_or_default(),
            text @ CellValue::Text(_) => text,
        }
    }
}

impl Default for CellResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CellResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellResolver")
            .field("trim", &self.trim)
            .finish_non_exhaustive()
    }
}
