//! End-to-end import cycles against in-memory and on-disk stores.

use std::fs;

use proptest::prelude::*;
use tempfile::tempdir;

use rowport_core::sink::{JsonRecordStore, MemorySink, Sink, SinkCall};
use rowport_core::store::{
    FlagStore, JsonFlags, JsonLedger, LedgerStore, MemoryFlags, MemoryLedger, SessionFlag,
};
use rowport_core::{
    Decision, ImportError, ImportSession, ImportWriter, SessionState, WriteMode, session_key,
};
use rowport_ingest::{ImportDataset, ImportOptions};
use rowport_model::{
    AttributeSpec, CellValue, CompositeRule, MappedRecord, RecordSpec, RecordTemplate, RuleTree,
};

fn dataset_of(rows: usize) -> ImportDataset {
    let tree = RuleTree::new().direct("name", 1);
    let records = (0..rows)
        .map(|row| MappedRecord::from_iter([("name", CellValue::from(format!("item {row}")))]))
        .collect();
    ImportDataset::from_records("catalog.csv", tree, records)
}

/// Persist one run so the ledger holds its ids.
fn seed(
    ledger: &mut MemoryLedger,
    flags: &mut MemoryFlags,
    sink: &mut MemorySink,
    rows: usize,
) -> Vec<rowport_core::sink::RecordId> {
    seed_key("k", ledger, flags, sink, rows)
}

fn seed_key(
    key: &str,
    ledger: &mut MemoryLedger,
    flags: &mut MemoryFlags,
    sink: &mut MemorySink,
    rows: usize,
) -> Vec<rowport_core::sink::RecordId> {
    let mut session = ImportSession::open(key, &mut *ledger, &mut *flags).unwrap();
    let mut writer = ImportWriter::new(&mut *sink);
    let report = writer
        .write(&mut session, &dataset_of(rows), &RecordTemplate::new(), true)
        .unwrap();
    report.created
}

#[test]
fn first_run_records_ids_in_row_order() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();

    let created = seed(&mut ledger, &mut flags, &mut sink, 3);

    assert_eq!(created.len(), 3);
    let titles: Vec<&str> = sink
        .records()
        .iter()
        .map(|stored| stored.record.title.as_str())
        .collect();
    assert_eq!(titles, vec!["item 0", "item 1", "item 2"]);
    assert_eq!(ledger.load("k").unwrap().unwrap().record_ids, created);
}

#[test]
fn rerun_without_decision_is_blocked() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed(&mut ledger, &mut flags, &mut sink, 2);

    let err = ImportSession::open("k", &mut ledger, &mut flags).unwrap_err();
    assert!(matches!(err, ImportError::PendingDecisionRequired { ref previous, .. } if previous.len() == 2));
}

#[test]
fn force_deletes_exactly_the_previous_ids() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    let previous = seed(&mut ledger, &mut flags, &mut sink, 2);
    sink.clear_calls();

    ImportSession::decide("k", &mut ledger, &mut flags, Decision::Force).unwrap();
    let mut session = ImportSession::open("k", &mut ledger, &mut flags).unwrap();
    assert_eq!(session.state(), SessionState::Force);

    let mut writer = ImportWriter::new(&mut sink);
    let report = writer
        .write(&mut session, &dataset_of(3), &RecordTemplate::new(), true)
        .unwrap();
    drop(session);
    drop(writer);

    assert_eq!(report.deleted, previous);
    let deletes: Vec<_> = sink
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            SinkCall::Delete(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(deletes, previous);

    // deletes happen before the first create
    let calls = sink.calls();
    let first_create = calls
        .iter()
        .position(|call| matches!(call, SinkCall::Create { .. }))
        .unwrap();
    let last_delete = calls
        .iter()
        .rposition(|call| matches!(call, SinkCall::Delete(_)))
        .unwrap();
    assert!(last_delete < first_create);

    assert_eq!(sink.records().len(), 3);
    assert_eq!(ledger.load("k").unwrap().unwrap().record_ids, report.created);
    assert!(!flags.get("k", SessionFlag::Force).unwrap());
}

#[test]
fn continue_never_deletes_and_replaces_the_ledger() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed(&mut ledger, &mut flags, &mut sink, 2);
    sink.clear_calls();

    ImportSession::decide("k", &mut ledger, &mut flags, Decision::Continue).unwrap();
    let mut session = ImportSession::open("k", &mut ledger, &mut flags).unwrap();
    let mut writer = ImportWriter::new(&mut sink);
    let report = writer
        .write(&mut session, &dataset_of(2), &RecordTemplate::new(), true)
        .unwrap();
    assert_eq!(session.state(), SessionState::Clean);
    drop(session);
    drop(writer);

    assert!(report.deleted.is_empty());
    assert!(
        !sink
            .calls()
            .iter()
            .any(|call| matches!(call, SinkCall::Delete(_) | SinkCall::List { .. }))
    );
    assert_eq!(sink.records().len(), 4);
    assert_eq!(ledger.load("k").unwrap().unwrap().record_ids, report.created);
}

#[test]
fn cancel_then_open_is_clean_and_keeps_records() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed(&mut ledger, &mut flags, &mut sink, 2);

    ImportSession::decide("k", &mut ledger, &mut flags, Decision::Cancel).unwrap();
    let session = ImportSession::open("k", &mut ledger, &mut flags).unwrap();

    assert_eq!(session.state(), SessionState::Clean);
    assert_eq!(sink.records().len(), 2);
}

#[test]
fn dry_run_makes_no_sink_calls_and_consumes_flags() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed(&mut ledger, &mut flags, &mut sink, 1);
    sink.clear_calls();

    ImportSession::decide("k", &mut ledger, &mut flags, Decision::Force).unwrap();
    let mut session = ImportSession::open("k", &mut ledger, &mut flags).unwrap();
    let mut writer = ImportWriter::new(&mut sink);
    let report = writer
        .write(&mut session, &dataset_of(2), &RecordTemplate::new(), false)
        .unwrap();
    drop(session);
    drop(writer);

    assert_eq!(report.mode, WriteMode::DryRun);
    assert_eq!(report.previews.len(), 2);
    assert!(report.created.is_empty());
    assert!(sink.calls().is_empty());

    let err = ImportSession::open("k", &mut ledger, &mut flags).unwrap_err();
    assert!(matches!(err, ImportError::PendingDecisionRequired { .. }));
}

#[test]
fn force_against_unknown_kind_fails_before_deleting() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed(&mut ledger, &mut flags, &mut sink, 1);
    sink.clear_calls();

    ImportSession::decide("k", &mut ledger, &mut flags, Decision::Force).unwrap();
    let mut session = ImportSession::open("k", &mut ledger, &mut flags).unwrap();
    let template = RecordTemplate::new().with_record(RecordSpec {
        kind: "product".to_string(),
        ..RecordSpec::default()
    });
    let mut writer = ImportWriter::new(&mut sink);
    let err = writer
        .write(&mut session, &dataset_of(1), &template, true)
        .unwrap_err();

    assert!(matches!(err, ImportError::UnknownRecordKind { ref kind } if kind == "product"));
    assert_eq!(
        writer.sink().calls(),
        vec![SinkCall::KindExists("product".to_string())]
    );
}

#[test]
fn decision_for_one_source_leaves_others_pending() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed_key("a", &mut ledger, &mut flags, &mut sink, 1);
    let other = seed_key("b", &mut ledger, &mut flags, &mut sink, 1);
    sink.clear_calls();

    ImportSession::decide("a", &mut ledger, &mut flags, Decision::Force).unwrap();

    let err = ImportSession::open("b", &mut ledger, &mut flags).unwrap_err();
    assert!(matches!(
        err,
        ImportError::PendingDecisionRequired { ref key, ref previous } if key == "b" && *previous == other
    ));
    assert!(sink.calls().is_empty());
    assert_eq!(sink.records().len(), 2);
}

#[test]
fn failed_write_keeps_the_decision_of_its_own_source() {
    let mut ledger = MemoryLedger::new();
    let mut flags = MemoryFlags::new();
    let mut sink = MemorySink::new();
    seed_key("a", &mut ledger, &mut flags, &mut sink, 1);
    seed_key("b", &mut ledger, &mut flags, &mut sink, 1);

    ImportSession::decide("a", &mut ledger, &mut flags, Decision::Force).unwrap();
    let mut session = ImportSession::open("a", &mut ledger, &mut flags).unwrap();
    let mut writer = ImportWriter::new(&mut sink);
    let err = writer
        .write(&mut session, &dataset_of(0), &RecordTemplate::new(), true)
        .unwrap_err();
    drop(session);
    drop(writer);

    assert!(matches!(err, ImportError::EmptyDataset));
    assert!(flags.get("a", SessionFlag::Force).unwrap());
    assert!(!flags.get("b", SessionFlag::Force).unwrap());
    assert!(!flags.get("b", SessionFlag::Continue).unwrap());
    assert_eq!(sink.records().len(), 2);

    let err = ImportSession::open("b", &mut ledger, &mut flags).unwrap_err();
    assert!(matches!(err, ImportError::PendingDecisionRequired { .. }));
}

#[test]
fn attributes_are_stored_per_record() {
    let tree = RuleTree::new()
        .direct("name", 1)
        .direct("sku", 2)
        .composite("tags", CompositeRule::columns([3]).with_separator(","));
    let dataset = ImportDataset::from_records(
        "catalog.csv",
        tree,
        vec![MappedRecord::from_iter([
            ("name", CellValue::from("Desk")),
            ("sku", CellValue::from("D-1")),
            ("tags", CellValue::from(vec!["oak", "large"])),
        ])],
    );
    let template = RecordTemplate::new()
        .with_attribute("origin", AttributeSpec::literal("import"))
        .with_attribute("details", AttributeSpec::columns(["sku", "tags"]));

    let mut sink = MemorySink::new();
    let mut session = ImportSession::open("k", MemoryLedger::new(), MemoryFlags::new()).unwrap();
    let mut writer = ImportWriter::new(&mut sink);
    let report = writer.write(&mut session, &dataset, &template, true).unwrap();
    drop(writer);

    let stored = sink.get(report.created[0]).unwrap();
    assert_eq!(stored.attributes["origin"], serde_json::json!("import"));
    assert_eq!(
        stored.attributes["details"],
        serde_json::json!({"sku": "D-1", "tags": ["oak", "large"]})
    );
}

#[test]
fn dry_run_preview_snapshot() {
    let tree = RuleTree::new()
        .direct("name", 1)
        .direct("summary", 2)
        .direct("sku", 3)
        .composite("tags", CompositeRule::columns([4]).with_separator(","));
    let dataset = ImportDataset::from_records(
        "catalog.csv",
        tree,
        vec![MappedRecord::from_iter([
            ("name", CellValue::from("<h1>Desk</h1>")),
            ("summary", CellValue::from(vec!["Solid", "oak"])),
            ("sku", CellValue::from("D-1")),
            ("tags", CellValue::from(vec!["oak", "large"])),
        ])],
    );
    let template = RecordTemplate::new()
        .with_record(RecordSpec {
            body: Some("summary".to_string()),
            ..RecordSpec::default()
        })
        .with_attribute("origin", AttributeSpec::literal("import"))
        .with_attribute("details", AttributeSpec::named([("code", "sku"), ("tags", "tags")]));

    let mut session = ImportSession::open("k", MemoryLedger::new(), MemoryFlags::new()).unwrap();
    let mut writer = ImportWriter::new(MemorySink::new());
    let report = writer.write(&mut session, &dataset, &template, false).unwrap();

    insta::assert_json_snapshot!(report, @r#"
    {
      "mode": "dry_run",
      "previews": [
        {
          "row": 0,
          "title": "Desk",
          "body": "Solid oak",
          "kind": "post",
          "status": "draft",
          "attributes": {
            "origin": "import",
            "details": {
              "code": "D-1",
              "tags": [
                "oak",
                "large"
              ]
            }
          }
        }
      ],
      "created": [],
      "deleted": [],
      "source_changed": false
    }
    "#);
}

#[test]
fn on_disk_cycle_detects_source_change() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("Spring Catalog.csv");
    fs::write(&source, "Desk;120\nLamp;40\n").unwrap();

    let tree = RuleTree::new().direct("name", 1).direct("price", 2);
    let key = session_key("Spring Catalog.csv");
    assert_eq!(key, "rowport_import_spring-catalog-csv");
    let store_dir = dir.path().join(".rowport");

    let run = |persist: bool, decision: Option<Decision>| {
        let mut ledger = JsonLedger::new(store_dir.join("sessions")).unwrap();
        let mut flags = JsonFlags::new(store_dir.join("flags.json"));
        if let Some(decision) = decision {
            ImportSession::decide(&key, &mut ledger, &mut flags, decision).unwrap();
        }
        let dataset =
            ImportDataset::load(&source, &ImportOptions::default(), tree.clone()).unwrap();
        let mut session = ImportSession::open(key.clone(), ledger, flags).unwrap();
        let mut writer = ImportWriter::new(JsonRecordStore::open(&store_dir).unwrap());
        writer
            .write(&mut session, &dataset, &RecordTemplate::new(), persist)
            .unwrap()
    };

    let first = run(true, None);
    assert!(!first.source_changed);

    fs::write(&source, "Desk;130\n").unwrap();

    let second = run(true, Some(Decision::Force));
    assert!(second.source_changed);
    assert_eq!(second.deleted, first.created);

    let store = JsonRecordStore::open(&store_dir).unwrap();
    let titles: Vec<&str> = store
        .records()
        .iter()
        .map(|stored| stored.record.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Desk"]);
    assert!(store.record_kind_exists("post"));
}

proptest! {
    #[test]
    fn persisted_runs_create_one_record_per_row(rows in 1usize..20) {
        let mut sink = MemorySink::new();
        let mut ledger = MemoryLedger::new();
        let mut session = ImportSession::open("k", &mut ledger, MemoryFlags::new()).unwrap();
        let mut writer = ImportWriter::new(&mut sink);
        let report = writer
            .write(&mut session, &dataset_of(rows), &RecordTemplate::new(), true)
            .unwrap();
        drop(session);
        drop(writer);

        let creates = sink
            .calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Create { .. }))
            .count();
        prop_assert_eq!(creates, rows);
        prop_assert_eq!(report.created.len(), rows);
        let ledger_ids = ledger.load("k").unwrap().unwrap().record_ids;
        prop_assert_eq!(&ledger_ids, &report.created);
        prop_assert!(ledger_ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn force_deletes_only_previous_ids(previous_rows in 1usize..8, next_rows in 1usize..8) {
        let mut ledger = MemoryLedger::new();
        let mut flags = MemoryFlags::new();
        let mut sink = MemorySink::new();
        let previous = seed(&mut ledger, &mut flags, &mut sink, previous_rows);
        sink.clear_calls();

        ImportSession::decide("k", &mut ledger, &mut flags, Decision::Force).unwrap();
        let mut session = ImportSession::open("k", &mut ledger, &mut flags).unwrap();
        let mut writer = ImportWriter::new(&mut sink);
        let report = writer
            .write(&mut session, &dataset_of(next_rows), &RecordTemplate::new(), true)
            .unwrap();
        drop(session);
        drop(writer);

        prop_assert_eq!(&report.deleted, &previous);
        prop_assert_eq!(sink.records().len(), next_rows);
    }
}
