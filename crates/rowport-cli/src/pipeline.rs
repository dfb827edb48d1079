//! Import pipeline over the on-disk store layout.
//!
//! ```text
//! <store>/records.json          record sink
//! <store>/flags.json            pending decision flags
//! <store>/sessions/<key>.json   per-source ledger
//! ```

use std::path::{Path, PathBuf};

use rowport_core::sink::JsonRecordStore;
use rowport_core::store::{FlagStore, JsonFlags, JsonLedger, LedgerEntry};
use rowport_core::{
    Decision, ImportProfile, ImportSession, ImportWriter, Result, SessionState, SessionStatus,
    WriteReport, session_key,
};
use rowport_ingest::ImportDataset;
use tracing::{debug, info};

use crate::logging::redact_value;

/// Default store directory, relative to the working directory.
pub const DEFAULT_STORE_DIR: &str = ".rowport";

/// Paths inside a store directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn flags_path(&self) -> PathBuf {
        self.root.join("flags.json")
    }

    fn ledger(&self) -> Result<JsonLedger> {
        Ok(JsonLedger::new(self.sessions_dir())?)
    }

    fn flags(&self) -> JsonFlags {
        JsonFlags::new(self.flags_path())
    }
}

/// One `import` invocation.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub profile: ImportProfile,
    pub source: PathBuf,
    pub decision: Option<Decision>,
    pub persist: bool,
    /// Kinds to register in the record store before writing.
    pub register_kinds: Vec<String>,
    /// Where a caller should resume after deciding.
    pub return_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub key: String,
    pub source: PathBuf,
    pub report: WriteReport,
}

/// Session key for a source path; only its file name counts.
pub fn key_for_source(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    session_key(&name)
}

/// Load the source, apply the decision, open the session and write.
pub fn run_import(request: &ImportRequest, store: &StoreLayout) -> Result<ImportOutcome> {
    let key = key_for_source(&request.source);
    // A decision is only recorded once the source is known to load.
    let dataset = ImportDataset::load(
        &request.source,
        &request.profile.options,
        request.profile.columns.clone(),
    )?;

    let mut ledger = store.ledger()?;
    let mut flags = store.flags();

    if let Some(decision) = request.decision {
        ImportSession::decide(&key, &mut ledger, &mut flags, decision)?;
    }

    let status = ImportSession::inspect(&key, &ledger, &flags)?;
    if status.state == SessionState::PendingDecision {
        flags.set_return_to(request.return_to.clone())?;
    }
    let mut session = ImportSession::open(key.clone(), &mut ledger, &mut flags)?;

    let mut sink = JsonRecordStore::open(store.root())?;
    for kind in &request.register_kinds {
        sink.register_kind(kind)?;
    }

    let mut writer = ImportWriter::new(sink);
    let report = writer.write(
        &mut session,
        &dataset,
        &request.profile.template,
        request.persist,
    )?;

    for preview in &report.previews {
        debug!(row = preview.row, title = redact_value(&preview.title), "record");
    }
    info!(
        key = %key,
        created = report.created.len(),
        deleted = report.deleted.len(),
        source_changed = report.source_changed,
        "import finished"
    );

    Ok(ImportOutcome {
        key,
        source: request.source.clone(),
        report,
    })
}

/// Current session state for a source.
pub fn session_status(source: &Path, store: &StoreLayout) -> Result<SessionStatus> {
    let key = key_for_source(source);
    let ledger = store.ledger()?;
    ImportSession::inspect(&key, &ledger, &store.flags())
}

/// Record a decision for a source and report the resulting state.
///
/// Returns the stored resume location alongside the status.
pub fn record_decision(
    source: &Path,
    store: &StoreLayout,
    decision: Decision,
) -> Result<(SessionStatus, Option<String>)> {
    let key = key_for_source(source);
    let mut ledger = store.ledger()?;
    let mut flags = store.flags();
    ImportSession::decide(&key, &mut ledger, &mut flags, decision)?;
    let return_to = flags.return_to()?;
    let status = ImportSession::inspect(&key, &ledger, &flags)?;
    Ok((status, return_to))
}

/// Every recorded session in the store.
pub fn list_sessions(store: &StoreLayout) -> Result<Vec<(String, LedgerEntry)>> {
    Ok(store.ledger()?.list()?)
}
