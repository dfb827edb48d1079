//! In-memory sink that records every call.

use std::cell::RefCell;

use rowport_model::AttributeValue;

use super::{NewRecord, RecordId, RecordTable, Sink, StoredRecord};
use crate::error::SinkError;

/// One call made against a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Create { title: String, kind: String },
    List { kind: String, ids: Vec<RecordId> },
    Delete(RecordId),
    SetAttribute { id: RecordId, key: String },
    KindExists(String),
}

#[derive(Debug, Default)]
pub struct MemorySink {
    table: RecordTable,
    calls: RefCell<Vec<SinkCall>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_kind(mut self, kind: &str) -> Self {
        self.table.register_kind(kind);
        self
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn records(&self) -> &[StoredRecord] {
        self.table.records()
    }

    pub fn get(&self, id: RecordId) -> Option<&StoredRecord> {
        self.table.get(id)
    }

    fn log(&self, call: SinkCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Sink for MemorySink {
    fn create_record(&mut self, record: &NewRecord) -> Result<RecordId, SinkError> {
        self.log(SinkCall::Create {
            title: record.title.clone(),
            kind: record.kind.clone(),
        });
        self.table.create(record)
    }

    fn list_records_by_ids(
        &self,
        kind: &str,
        ids: &[RecordId],
    ) -> Result<Vec<StoredRecord>, SinkError> {
        self.log(SinkCall::List {
            kind: kind.to_string(),
            ids: ids.to_vec(),
        });
        Ok(self.table.by_ids(kind, ids))
    }

    fn delete_record(&mut self, id: RecordId) -> Result<(), SinkError> {
        self.log(SinkCall::Delete(id));
        self.table.delete(id)
    }

    fn set_attribute(
        &mut self,
        id: RecordId,
        key: &str,
        value: &AttributeValue,
    ) -> Result<(), SinkError> {
        self.log(SinkCall::SetAttribute {
            id,
            key: key.to_string(),
        });
        self.table.set_attribute(id, key, value)
    }

    fn record_kind_exists(&self, kind: &str) -> bool {
        self.log(SinkCall::KindExists(kind.to_string()));
        self.table.kind_exists(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn test_calls_are_logged_in_order() {
        let mut sink = MemorySink::new();
        let id = sink
            .create_record(&NewRecord {
                title: "Desk".to_string(),
                body: String::new(),
                kind: "post".to_string(),
                status: "draft".to_string(),
                fields: IndexMap::new(),
            })
            .unwrap();
        sink.set_attribute(id, "price", &AttributeValue::Literal(json!("120")))
            .unwrap();
        sink.delete_record(id).unwrap();

        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Create {
                    title: "Desk".to_string(),
                    kind: "post".to_string()
                },
                SinkCall::SetAttribute {
                    id,
                    key: "price".to_string()
                },
                SinkCall::Delete(id),
            ]
        );
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_delete_unknown_record() {
        let mut sink = MemorySink::new();
        assert!(matches!(
            sink.delete_record(RecordId(5)),
            Err(SinkError::RecordNotFound(RecordId(5)))
        ));
    }
}
