//! Record sinks: where imported rows end up.

mod json;
mod memory;

pub use json::JsonRecordStore;
pub use memory::{MemorySink, SinkCall};

use std::fmt;

use indexmap::IndexMap;
use rowport_model::AttributeValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SinkError;

/// Record kinds a fresh store accepts.
pub const DEFAULT_KINDS: [&str; 2] = ["post", "page"];

/// Identifier assigned by a sink to a created record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record about to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    pub body: String,
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Value>,
}

/// A record as held by a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: NewRecord,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
}

/// Destination for imported records.
pub trait Sink {
    fn create_record(&mut self, record: &NewRecord) -> Result<RecordId, SinkError>;

    /// Records of `kind` among `ids`; unknown ids are left out.
    fn list_records_by_ids(
        &self,
        kind: &str,
        ids: &[RecordId],
    ) -> Result<Vec<StoredRecord>, SinkError>;

    fn delete_record(&mut self, id: RecordId) -> Result<(), SinkError>;

    fn set_attribute(
        &mut self,
        id: RecordId,
        key: &str,
        value: &AttributeValue,
    ) -> Result<(), SinkError>;

    fn record_kind_exists(&self, kind: &str) -> bool;
}

impl<T: Sink + ?Sized> Sink for &mut T {
    fn create_record(&mut self, record: &NewRecord) -> Result<RecordId, SinkError> {
        (**self).create_record(record)
    }

    fn list_records_by_ids(
        &self,
        kind: &str,
        ids: &[RecordId],
    ) -> Result<Vec<StoredRecord>, SinkError> {
        (**self).list_records_by_ids(kind, ids)
    }

    fn delete_record(&mut self, id: RecordId) -> Result<(), SinkError> {
        (**self).delete_record(id)
    }

    fn set_attribute(
        &mut self,
        id: RecordId,
        key: &str,
        value: &AttributeValue,
    ) -> Result<(), SinkError> {
        (**self).set_attribute(id, key, value)
    }

    fn record_kind_exists(&self, kind: &str) -> bool {
        (**self).record_kind_exists(kind)
    }
}

/// Attribute values as stored: plain JSON.
pub(crate) fn attribute_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Literal(value) => value.clone(),
        AttributeValue::Bucket(bucket) => Value::Object(
            bucket
                .iter()
                .map(|(key, cell)| (key.clone(), serde_json::to_value(cell).unwrap_or(Value::Null)))
                .collect(),
        ),
    }
}

/// Shared record bookkeeping for the bundled sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecordTable {
    next_id: u64,
    kinds: Vec<String>,
    records: Vec<StoredRecord>,
}

impl Default for RecordTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            kinds: DEFAULT_KINDS.iter().map(|kind| (*kind).to_string()).collect(),
            records: Vec::new(),
        }
    }
}

impl RecordTable {
    pub(crate) fn register_kind(&mut self, kind: &str) {
        if !self.kind_exists(kind) {
            self.kinds.push(kind.to_string());
        }
    }

    pub(crate) fn kind_exists(&self, kind: &str) -> bool {
        self.kinds.iter().any(|known| known == kind)
    }

    pub(crate) fn create(&mut self, record: &NewRecord) -> Result<RecordId, SinkError> {
        if !self.kind_exists(&record.kind) {
            return Err(SinkError::UnknownKind(record.kind.clone()));
        }
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.push(StoredRecord {
            id,
            record: record.clone(),
            attributes: IndexMap::new(),
        });
        Ok(id)
    }

    pub(crate) fn by_ids(&self, kind: &str, ids: &[RecordId]) -> Vec<StoredRecord> {
        ids.iter()
            .filter_map(|id| self.get(*id))
            .filter(|stored| stored.record.kind == kind)
            .cloned()
            .collect()
    }

    pub(crate) fn delete(&mut self, id: RecordId) -> Result<(), SinkError> {
        let position = self
            .records
            .iter()
            .position(|stored| stored.id == id)
            .ok_or(SinkError::RecordNotFound(id))?;
        self.records.remove(position);
        Ok(())
    }

    pub(crate) fn set_attribute(
        &mut self,
        id: RecordId,
        key: &str,
        value: &AttributeValue,
    ) -> Result<(), SinkError> {
        let stored = self
            .records
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or(SinkError::RecordNotFound(id))?;
        stored.attributes.insert(key.to_string(), attribute_json(value));
        Ok(())
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<&StoredRecord> {
        self.records.iter().find(|stored| stored.id == id)
    }

    pub(crate) fn records(&self) -> &[StoredRecord] {
        &self.records
    }
}
