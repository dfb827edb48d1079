//! Column-mapping engine.
//!
//! Resolves a [`RuleTree`](rowport_model::RuleTree) against raw rows:
//!
//! - [`RawRow`]: 1-based cell addressing with a sentinel at index 0
//! - [`CellResolver`]: one rule, one row, one value
//! - [`RowMapper`]: a whole tree against a row, producing a
//!   [`MappedRecord`](rowport_model::MappedRecord)
//! - [`CellFilter`]: per-column post-processing hook
//!
//! # Example
//!
//! ```
//! use rowport_map::{CellResolver, EmptyCellPolicy, RawRow, RowMapper};
//! use rowport_model::{CellValue, CompositeRule, RuleTree};
//!
//! let tree = RuleTree::new()
//!     .direct("name", 1)
//!     .composite("tags", CompositeRule::columns([2]).with_separator(","));
//! let mapper = RowMapper::new(CellResolver::new().with_trim(true));
//! let row = RawRow::from_cells([" Desk ", "oak, large"], EmptyCellPolicy::Compact);
//!
//! let record = mapper.map_row(&tree, &row);
//! assert_eq!(record.get("name"), Some(&CellValue::from("Desk")));
//! assert_eq!(record.get("tags"), Some(&CellValue::from(vec!["oak", "large"])));
//! ```

mod filter;
mod mapper;
mod raw;
mod resolver;

pub use filter::{CellFilter, PassThrough};
pub use mapper::RowMapper;
pub use raw::{EmptyCellPolicy, RawRow};
pub use resolver::{CellResolver, ResolveContext};
