//! Per-cell post-processing hook.

use rowport_model::CellValue;

/// Post-processes each top-level resolved column.
///
/// The filter always receives a list (scalars are boxed into one element).
/// For a direct column a returned list collapses to its first element and a
/// returned text is used verbatim; for a composite column the returned value
/// is stored as is.
pub trait CellFilter {
    fn filter(&self, column: &str, values: Vec<CellValue>) -> CellValue;
}

/// Identity filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl CellFilter for PassThrough {
    fn filter(&self, _column: &str, values: Vec<CellValue>) -> CellValue {
        CellValue::List(values)
    }
}

impl<F> CellFilter for F
where
    F: Fn(&str, Vec<CellValue>) -> CellValue,
{
    fn filter(&self, column: &str, values: Vec<CellValue>) -> CellValue {
        self(column, values)
    }
}
