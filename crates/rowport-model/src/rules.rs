//! Column-mapping rules.
//!
//! A [`RuleTree`] maps output column names to [`ColumnRule`]s. Column indices
//! are 1-based: index 0 addresses the sentinel cell every raw row starts with.
//!
//! Rule trees are usually written as JSON:
//!
//! ```json
//! {
//!     "name": 1,
//!     "tags": { "col": [3, 4], "cell_separator": "," },
//!     "gallery": { "col": [5, { "col": [6, 7] }] }
//! }
//! ```
//!
//! Parsing is permissive: a composite whose `col` key is missing or empty is
//! kept as a composite without sources, and the mapper skips it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};

/// Key holding the source columns of a composite rule.
pub const COLUMNS_KEY: &str = "col";

/// Key holding the optional split separator of a composite rule.
pub const SEPARATOR_KEY: &str = "cell_separator";

/// How a single output column is resolved from a raw row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRule {
    /// Take one raw cell.
    Direct(usize),
    /// Aggregate several raw cells (or nested rules) into a list.
    Composite(CompositeRule),
}

impl ColumnRule {
    /// True for composite rules.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Direct(index) => Value::from(*index),
            Self::Composite(rule) => rule.to_json(),
        }
    }
}

impl From<CompositeRule> for ColumnRule {
    fn from(rule: CompositeRule) -> Self {
        Self::Composite(rule)
    }
}

/// A multi-column rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeRule {
    /// Referenced cells, in output order.
    pub sources: Vec<RuleSource>,
    /// When set, every referenced cell is split on this separator.
    pub separator: Option<String>,
}

impl CompositeRule {
    /// Composite over the given sources.
    pub fn new(sources: Vec<RuleSource>) -> Self {
        Self {
            sources,
            separator: None,
        }
    }

    /// Composite over plain column indices.
    pub fn columns(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::new(indices.into_iter().map(RuleSource::Index).collect())
    }

    /// Split every referenced cell on `separator`. An empty separator clears it.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.separator = (!separator.is_empty()).then_some(separator);
        self
    }

    /// True when the rule references nothing and will be skipped.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        let sources = self.sources.iter().map(RuleSource::to_json).collect();
        map.insert(COLUMNS_KEY.to_string(), Value::Array(sources));
        if let Some(separator) = &self.separator {
            map.insert(SEPARATOR_KEY.to_string(), Value::from(separator.clone()));
        }
        Value::Object(map)
    }
}

/// One entry of a composite rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// A raw column index.
    Index(usize),
    /// A rule resolved recursively; its value becomes one list element.
    Nested(ColumnRule),
}

impl RuleSource {
    fn to_json(&self) -> Value {
        match self {
            Self::Index(index) => Value::from(*index),
            Self::Nested(rule) => rule.to_json(),
        }
    }
}

impl From<usize> for RuleSource {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<CompositeRule> for RuleSource {
    fn from(rule: CompositeRule) -> Self {
        Self::Nested(ColumnRule::Composite(rule))
    }
}

/// Ordered mapping from output column name to rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct RuleTree {
    rules: IndexMap<String, ColumnRule>,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a direct column.
    #[must_use]
    pub fn direct(mut self, column: impl Into<String>, index: usize) -> Self {
        self.insert(column, ColumnRule::Direct(index));
        self
    }

    /// Add a composite column.
    #[must_use]
    pub fn composite(mut self, column: impl Into<String>, rule: CompositeRule) -> Self {
        self.insert(column, ColumnRule::Composite(rule));
        self
    }

    /// Insert a rule. An existing column keeps its position and gets the new rule.
    pub fn insert(&mut self, column: impl Into<String>, rule: ColumnRule) {
        self.rules.insert(column.into(), rule);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnRule> {
        self.rules.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Output column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// The first output column, used as the default record title.
    pub fn first_column(&self) -> Option<&str> {
        self.rules.keys().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse a rule tree from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if `value` is not an object, or if an
    /// entry is a scalar that is not a column index.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(ModelError::config(format!(
                "expected an object of column rules, found {}",
                json_kind(value)
            )));
        };
        let mut tree = Self::new();
        for (column, entry) in entries {
            tree.insert(column.clone(), parse_rule(column, entry)?);
        }
        Ok(tree)
    }

    /// Parse a rule tree from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Render the tree back to its JSON form.
    pub fn to_json(&self) -> Value {
        let entries = self
            .rules
            .iter()
            .map(|(column, rule)| (column.clone(), rule.to_json()))
            .collect::<Map<String, Value>>();
        Value::Object(entries)
    }
}

impl TryFrom<Value> for RuleTree {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_json(&value)
    }
}

impl From<RuleTree> for Value {
    fn from(tree: RuleTree) -> Self {
        tree.to_json()
    }
}

fn parse_rule(column: &str, value: &Value) -> Result<ColumnRule> {
    match value {
        Value::Object(map) => Ok(ColumnRule::Composite(parse_composite(column, map)?)),
        other => parse_index(other).map(ColumnRule::Direct).ok_or_else(|| {
            ModelError::config(format!(
                "column '{column}': expected a column index or a composite rule, found {}",
                json_kind(other)
            ))
        }),
    }
}

fn parse_composite(column: &str, map: &Map<String, Value>) -> Result<CompositeRule> {
    let separator = map
        .get(SEPARATOR_KEY)
        .and_then(Value::as_str)
        .filter(|separator| !separator.is_empty())
        .map(str::to_string);
    let sources = match map.get(COLUMNS_KEY) {
        None => Vec::new(),
        Some(value) if is_blank(value) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| parse_source(column, item))
            .collect::<Result<Vec<_>>>()?,
        Some(item) => vec![parse_source(column, item)?],
    };
    Ok(CompositeRule { sources, separator })
}

fn parse_source(column: &str, item: &Value) -> Result<RuleSource> {
    match item {
        Value::Object(map) => Ok(RuleSource::from(parse_composite(column, map)?)),
        // A bare list is a nested rule without a `col` key; it resolves to nothing.
        Value::Array(_) => Ok(RuleSource::from(CompositeRule::default())),
        other => parse_index(other).map(RuleSource::Index).ok_or_else(|| {
            ModelError::config(format!(
                "column '{column}': composite source must be an index or a rule, found {}",
                json_kind(other)
            ))
        }),
    }
}

fn parse_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Values that count as "no columns" for a composite `col` key.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(number) => number.as_u64() == Some(0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(true) => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
