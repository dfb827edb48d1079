//! Record templates: how mapped rows become sink records.
//!
//! ```json
//! {
//!     "record": { "title": "name", "body": "description", "kind": "post" },
//!     "attributes": {
//!         "origin": "csv-import",
//!         "prices": ["price", "discount"],
//!         "links": { "homepage": "url" }
//!     }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::CellValue;
use crate::rules::RuleTree;

/// Default record kind when the template names none.
pub const DEFAULT_KIND: &str = "post";

/// Default record status when the template names none.
pub const DEFAULT_STATUS: &str = "draft";

/// Template applied to every mapped row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordTemplate {
    /// Core record fields.
    pub record: RecordSpec,
    /// Auxiliary attributes stored alongside each record, in order.
    pub attributes: IndexMap<String, AttributeSpec>,
}

impl RecordTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(mut self, record: RecordSpec) -> Self {
        self.record = record;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, spec: AttributeSpec) -> Self {
        self.attributes.insert(key.into(), spec);
        self
    }
}

/// Core fields of the record created for each row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSpec {
    /// Column holding the title. Defaults to the first rule-tree column.
    pub title: Option<String>,
    /// Column holding the body. Defaults to an empty body.
    pub body: Option<String>,
    /// Record kind in the sink.
    pub kind: String,
    /// Record status in the sink.
    pub status: String,
    /// Extra constant fields passed through to the sink.
    pub fields: IndexMap<String, Value>,
}

impl Default for RecordSpec {
    fn default() -> Self {
        Self {
            title: None,
            body: None,
            kind: DEFAULT_KIND.to_string(),
            status: DEFAULT_STATUS.to_string(),
            fields: IndexMap::new(),
        }
    }
}

impl RecordSpec {
    /// Column used for the title, falling back to the tree's first column.
    pub fn title_column<'a>(&'a self, tree: &'a RuleTree) -> Option<&'a str> {
        self.title.as_deref().or_else(|| tree.first_column())
    }

    /// Column used for the body, if any.
    pub fn body_column(&self) -> Option<&str> {
        self.body.as_deref().filter(|column| !column.is_empty())
    }
}

/// Sub-key of an attribute bucket entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKey {
    /// The column name doubles as the sub-key.
    Positional,
    /// An explicit sub-key.
    Named(String),
}

impl AttributeKey {
    /// The sub-key to store `column` under.
    pub fn resolve<'a>(&'a self, column: &'a str) -> &'a str {
        match self {
            Self::Positional => column,
            Self::Named(key) => key,
        }
    }
}

/// How one auxiliary attribute is produced.
///
/// Scalars are literal constants repeated for every row. Arrays and objects
/// list columns to read; numeric object keys behave like array positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AttributeSpec {
    Literal(Value),
    Columns(Vec<(AttributeKey, String)>),
}

impl AttributeSpec {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Columns stored under their own names.
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(
            columns
                .into_iter()
                .map(|column| (AttributeKey::Positional, column.into()))
                .collect(),
        )
    }

    /// Columns stored under explicit sub-keys: `(sub_key, column)`.
    pub fn named<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<String>,
    {
        Self::Columns(
            entries
                .into_iter()
                .map(|(key, column)| (AttributeKey::Named(key.into()), column.into()))
                .collect(),
        )
    }
}

impl From<Value> for AttributeSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Columns(
                items
                    .into_iter()
                    .map(|item| (AttributeKey::Positional, column_name(item)))
                    .collect(),
            ),
            Value::Object(map) => Self::Columns(
                map.into_iter()
                    .map(|(key, item)| {
                        let key = if is_numeric_key(&key) {
                            AttributeKey::Positional
                        } else {
                            AttributeKey::Named(key)
                        };
                        (key, column_name(item))
                    })
                    .collect(),
            ),
            other => Self::Literal(other),
        }
    }
}

/// Numeric object keys (`"0"`, `"-1"`, `"1.5"`, `"2e3"`) are positions,
/// not sub-keys.
fn is_numeric_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
        && key.parse::<f64>().is_ok_and(f64::is_finite)
}

impl From<AttributeSpec> for Value {
    fn from(spec: AttributeSpec) -> Self {
        match spec {
            AttributeSpec::Literal(value) => value,
            AttributeSpec::Columns(entries) => {
                let positional = entries
                    .iter()
                    .all(|(key, _)| matches!(key, AttributeKey::Positional));
                if positional {
                    Value::Array(entries.into_iter().map(|(_, c)| Value::from(c)).collect())
                } else {
                    let mut map = serde_json::Map::new();
                    for (idx, (key, column)) in entries.into_iter().enumerate() {
                        let key = match key {
                            AttributeKey::Positional => idx.to_string(),
                            AttributeKey::Named(key) => key,
                        };
                        map.insert(key, Value::from(column));
                    }
                    Value::Object(map)
                }
            }
        }
    }
}

fn column_name(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// A stored attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A literal constant from the template.
    Literal(Value),
    /// A bucket of resolved columns keyed by sub-key.
    Bucket(IndexMap<String, CellValue>),
}
