//! Resolved cell values and mapped records.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A resolved output value: a single string or an ordered list.
///
/// Lists come from composite rules. A composite source that is itself a
/// composite contributes a nested list element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    List(Vec<CellValue>),
}

impl CellValue {
    /// The empty text value used for absent cells.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Box a scalar into a one-element list; lists are returned unchanged.
    pub fn into_list(self) -> Vec<CellValue> {
        match self {
            Self::Text(text) => vec![Self::Text(text)],
            Self::List(items) => items,
        }
    }

    /// All text leaves, depth first.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Text(text) => out.push(text),
            Self::List(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
        }
    }

    /// Flatten to text, joining leaves with `separator`.
    pub fn joined(&self, separator: &str) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(_) => self.leaves().join(separator),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<CellValue>> for CellValue {
    fn from(items: Vec<CellValue>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for CellValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(Self::from).collect())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// One mapped row: output column name to resolved value, in rule-tree order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappedRecord {
    values: IndexMap<String, CellValue>,
}

impl MappedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for MappedRecord {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_flattens_nested_lists() {
        let value = CellValue::List(vec![
            CellValue::from("a"),
            CellValue::from(vec!["b", "c"]),
        ]);
        assert_eq!(value.joined(" "), "a b c");
        assert_eq!(value.leaves(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_into_list_boxes_scalars() {
        assert_eq!(CellValue::from("x").into_list(), vec![CellValue::from("x")]);
        assert_eq!(CellValue::List(vec![]).into_list(), vec![]);
    }

    #[test]
    fn test_display() {
        let value = CellValue::from(vec!["red", "blue"]);
        assert_eq!(value.to_string(), "[red, blue]");
        assert_eq!(CellValue::from("plain").to_string(), "plain");
    }

    #[test]
    fn test_untagged_serde() {
        let record: MappedRecord = [
            ("name", CellValue::from("Desk")),
            ("tags", CellValue::from(vec!["oak", "large"])),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Desk","tags":["oak","large"]}"#);
        let back: MappedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
