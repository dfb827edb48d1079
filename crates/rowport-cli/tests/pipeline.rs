//! End-to-end runs of the import pipeline against a temporary store.

use std::fs;
use std::path::{Path, PathBuf};

use rowport_cli::pipeline::{
    ImportRequest, StoreLayout, key_for_source, list_sessions, record_decision, run_import,
    session_status,
};
use rowport_core::sink::JsonRecordStore;
use rowport_core::{Decision, ImportError, ImportProfile, SessionState, SinkError, WriteMode};
use tempfile::{TempDir, tempdir};

const PROFILE: &str = r#"{
    "delimiter": ";",
    "start_row": 2,
    "columns": { "name": 1, "price": 2, "tags": { "col": [3], "cell_separator": "," } },
    "record": { "title": "name", "kind": "post" },
    "attributes": { "price": ["price"], "tags": ["tags"] }
}"#;

const CATALOG: &str = "name;price;tags\nDesk;120;office,wood\nLamp;35;light\nChair;80;office\n";

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    store: StoreLayout,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let source = dir.path().join("catalog.csv");
    fs::write(&source, CATALOG).unwrap();
    let store = StoreLayout::new(dir.path().join("store"));
    Fixture {
        _dir: dir,
        source,
        store,
    }
}

fn request(source: &Path, persist: bool, decision: Option<Decision>) -> ImportRequest {
    ImportRequest {
        profile: ImportProfile::from_json_str(PROFILE).unwrap(),
        source: source.to_path_buf(),
        decision,
        persist,
        register_kinds: Vec::new(),
        return_to: Some("profile.json".to_string()),
    }
}

fn stored_titles(store: &StoreLayout) -> Vec<String> {
    let records = JsonRecordStore::open(store.root()).unwrap();
    records
        .records()
        .iter()
        .map(|record| record.record.title.clone())
        .collect()
}

#[test]
fn dry_run_writes_no_records() {
    let fx = fixture();
    let outcome = run_import(&request(&fx.source, false, None), &fx.store).unwrap();

    assert_eq!(outcome.report.mode, WriteMode::DryRun);
    assert_eq!(outcome.report.previews.len(), 3);
    assert!(outcome.report.created.is_empty());
    assert!(stored_titles(&fx.store).is_empty());
    assert_eq!(
        session_status(&fx.source, &fx.store).unwrap().state,
        SessionState::Clean
    );
}

#[test]
fn persisted_run_records_session() {
    let fx = fixture();
    let outcome = run_import(&request(&fx.source, true, None), &fx.store).unwrap();

    assert_eq!(outcome.key, "rowport_import_catalog-csv");
    assert_eq!(outcome.report.created.len(), 3);
    assert_eq!(stored_titles(&fx.store), vec!["Desk", "Lamp", "Chair"]);

    let sessions = list_sessions(&fx.store).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].0, outcome.key);
    assert_eq!(sessions[0].1.record_ids, outcome.report.created);
}

#[test]
fn rerun_without_decision_is_blocked_and_remembers_return_location() {
    let fx = fixture();
    run_import(&request(&fx.source, true, None), &fx.store).unwrap();

    let error = run_import(&request(&fx.source, true, None), &fx.store).unwrap_err();
    assert!(matches!(
        error,
        ImportError::PendingDecisionRequired { ref previous, .. } if previous.len() == 3
    ));
    assert_eq!(stored_titles(&fx.store).len(), 3);

    let (status, return_to) = record_decision(&fx.source, &fx.store, Decision::Force).unwrap();
    assert_eq!(status.state, SessionState::Force);
    assert_eq!(return_to.as_deref(), Some("profile.json"));
}

#[test]
fn force_replaces_previous_records() {
    let fx = fixture();
    let first = run_import(&request(&fx.source, true, None), &fx.store).unwrap();
    let second = run_import(
        &request(&fx.source, true, Some(Decision::Force)),
        &fx.store,
    )
    .unwrap();

    assert_eq!(second.report.deleted, first.report.created);
    assert_eq!(stored_titles(&fx.store), vec!["Desk", "Lamp", "Chair"]);
    assert_eq!(
        session_status(&fx.source, &fx.store).unwrap().entry.unwrap().record_ids,
        second.report.created
    );
}

#[test]
fn continue_keeps_previous_records() {
    let fx = fixture();
    run_import(&request(&fx.source, true, None), &fx.store).unwrap();
    let second = run_import(
        &request(&fx.source, true, Some(Decision::Continue)),
        &fx.store,
    )
    .unwrap();

    assert!(second.report.deleted.is_empty());
    assert_eq!(stored_titles(&fx.store).len(), 6);
}

#[test]
fn cancel_forgets_previous_run() {
    let fx = fixture();
    run_import(&request(&fx.source, true, None), &fx.store).unwrap();

    let (status, _) = record_decision(&fx.source, &fx.store, Decision::Cancel).unwrap();
    assert_eq!(status.state, SessionState::Clean);
    assert!(list_sessions(&fx.store).unwrap().is_empty());
    assert_eq!(stored_titles(&fx.store).len(), 3);
}

#[test]
fn unregistered_kind_is_rejected_until_registered() {
    let fx = fixture();
    let mut req = request(&fx.source, true, None);
    req.profile.template.record.kind = "product".to_string();

    let error = run_import(&req, &fx.store).unwrap_err();
    assert!(matches!(
        error,
        ImportError::Sink(SinkError::UnknownKind(ref kind)) if kind == "product"
    ));

    req.register_kinds = vec!["product".to_string()];
    let outcome = run_import(&req, &fx.store).unwrap();
    assert_eq!(outcome.report.created.len(), 3);
}

#[test]
fn decision_for_one_source_does_not_touch_another() {
    let fx = fixture();
    let other = fx.source.with_file_name("other.csv");
    fs::write(&other, CATALOG).unwrap();
    let first = run_import(&request(&other, true, None), &fx.store).unwrap();

    let (status, _) = record_decision(&fx.source, &fx.store, Decision::Force).unwrap();
    assert_eq!(status.state, SessionState::Clean);

    let error = run_import(&request(&other, true, None), &fx.store).unwrap_err();
    assert!(matches!(error, ImportError::PendingDecisionRequired { .. }));
    assert_eq!(
        session_status(&other, &fx.store).unwrap().entry.unwrap().record_ids,
        first.report.created
    );
    assert_eq!(stored_titles(&fx.store).len(), 3);
}

#[test]
fn decision_with_missing_source_is_not_recorded() {
    let fx = fixture();
    run_import(&request(&fx.source, true, None), &fx.store).unwrap();
    fs::remove_file(&fx.source).unwrap();

    let error = run_import(&request(&fx.source, true, Some(Decision::Force)), &fx.store)
        .unwrap_err();
    assert!(matches!(error, ImportError::Ingest(_)));
    assert_eq!(
        session_status(&fx.source, &fx.store).unwrap().state,
        SessionState::PendingDecision
    );
    assert_eq!(stored_titles(&fx.store).len(), 3);
}

#[test]
fn session_key_uses_file_name_only() {
    assert_eq!(
        key_for_source(Path::new("/data/Spring Catalog.CSV")),
        "rowport_import_spring-catalog-csv"
    );
}
