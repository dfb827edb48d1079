//! Record sink backed by a single JSON file.

use std::path::{Path, PathBuf};

use rowport_model::AttributeValue;

use super::{NewRecord, RecordId, RecordTable, Sink, StoredRecord};
use crate::error::SinkError;
use crate::io::{read_json, write_json_atomic};

/// File name used inside the store directory.
pub const RECORDS_FILE: &str = "records.json";

/// Records kept in `<dir>/records.json`, rewritten atomically after each
/// change.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    table: RecordTable,
}

impl JsonRecordStore {
    /// Open the store in `dir`, starting empty when no file exists yet.
    pub fn open(dir: &Path) -> Result<Self, SinkError> {
        let path = dir.join(RECORDS_FILE);
        let table = read_json(&path)?.unwrap_or_default();
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept records of `kind` from now on.
    pub fn register_kind(&mut self, kind: &str) -> Result<(), SinkError> {
        if self.table.kind_exists(kind) {
            return Ok(());
        }
        self.table.register_kind(kind);
        self.flush()
    }

    pub fn records(&self) -> &[StoredRecord] {
        self.table.records()
    }

    pub fn get(&self, id: RecordId) -> Option<&StoredRecord> {
        self.table.get(id)
    }

    fn flush(&self) -> Result<(), SinkError> {
        write_json_atomic(&self.path, &self.table)?;
        Ok(())
    }
}

impl Sink for JsonRecordStore {
    fn create_record(&mut self, record: &NewRecord) -> Result<RecordId, SinkError> {
        let id = self.table.create(record)?;
        self.flush()?;
        Ok(id)
    }

    fn list_records_by_ids(
        &self,
        kind: &str,
        ids: &[RecordId],
    ) -> Result<Vec<StoredRecord>, SinkError> {
        Ok(self.table.by_ids(kind, ids))
    }

    fn delete_record(&mut self, id: RecordId) -> Result<(), SinkError> {
        self.table.delete(id)?;
        self.flush()
    }

    fn set_attribute(
        &mut self,
        id: RecordId,
        key: &str,
        value: &AttributeValue,
    ) -> Result<(), SinkError> {
        self.table.set_attribute(id, key, value)?;
        self.flush()
    }

    fn record_kind_exists(&self, kind: &str) -> bool {
        self.table.kind_exists(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use rowport_model::CellValue;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(title: &str, kind: &str) -> NewRecord {
        NewRecord {
            title: title.to_string(),
            body: "<p>body</p>".to_string(),
            kind: kind.to_string(),
            status: "publish".to_string(),
            fields: IndexMap::new(),
        }
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = JsonRecordStore::open(dir.path()).unwrap();
        let id = store.create_record(&record("Desk", "post")).unwrap();
        let mut bucket = IndexMap::new();
        bucket.insert("price".to_string(), CellValue::from("120"));
        store
            .set_attribute(id, "details", &AttributeValue::Bucket(bucket))
            .unwrap();

        let reopened = JsonRecordStore::open(dir.path()).unwrap();
        let stored = reopened.get(id).unwrap();
        assert_eq!(stored.record.title, "Desk");
        assert_eq!(stored.attributes["details"], json!({"price": "120"}));
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = tempdir().unwrap();
        let first = {
            let mut store = JsonRecordStore::open(dir.path()).unwrap();
            store.create_record(&record("a", "post")).unwrap()
        };
        let mut store = JsonRecordStore::open(dir.path()).unwrap();
        let second = store.create_record(&record("b", "post")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_registered_kinds_persist() {
        let dir = tempdir().unwrap();
        let mut store = JsonRecordStore::open(dir.path()).unwrap();
        assert!(!store.record_kind_exists("product"));
        store.register_kind("product").unwrap();

        let reopened = JsonRecordStore::open(dir.path()).unwrap();
        assert!(reopened.record_kind_exists("product"));
        assert!(reopened.record_kind_exists("page"));
    }
}
