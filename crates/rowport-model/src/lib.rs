//! Data model for rowport.
//!
//! - [`RuleTree`] / [`ColumnRule`]: declarative column-mapping rules
//! - [`CellValue`] / [`MappedRecord`]: resolved row values
//! - [`RecordTemplate`]: how mapped rows become sink records and attributes

mod error;
mod record;
mod rules;
mod template;

pub use error::{ModelError, Result};
pub use record::{CellValue, MappedRecord};
pub use rules::{COLUMNS_KEY, ColumnRule, CompositeRule, RuleSource, RuleTree, SEPARATOR_KEY};
pub use template::{
    AttributeKey, AttributeSpec, AttributeValue, DEFAULT_KIND, DEFAULT_STATUS, RecordSpec,
    RecordTemplate,
};
