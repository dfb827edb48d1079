//! Turning a mapped dataset into sink records.

use std::time::Instant;

use indexmap::IndexMap;
use rowport_ingest::ImportDataset;
use rowport_model::{AttributeSpec, AttributeValue, CellValue, RecordTemplate};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::error::{ImportError, Result};
use crate::io::compute_file_hash;
use crate::session::{ImportSession, SessionState};
use crate::sink::{NewRecord, RecordId, Sink};
use crate::store::{FlagStore, LedgerEntry, LedgerStore, SessionFlag};
use crate::text::{PassThrough, StripMarkup, TextFilter};

/// Separator used to flatten list values into title and body text.
const FLATTEN_SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    DryRun,
    Persisted,
}

/// A record as it would be (or was) handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPreview {
    /// Zero-based dataset row.
    pub row: usize,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, AttributeValue>,
}

impl RecordPreview {
    fn to_new_record(&self) -> NewRecord {
        NewRecord {
            title: self.title.clone(),
            body: self.body.clone(),
            kind: self.kind.clone(),
            status: self.status.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Outcome of [`ImportWriter::write`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteReport {
    pub mode: WriteMode,
    pub previews: Vec<RecordPreview>,
    /// Created ids in row order.
    pub created: Vec<RecordId>,
    /// Ids removed by a forced overwrite.
    pub deleted: Vec<RecordId>,
    /// The source differs from the one the previous run recorded.
    pub source_changed: bool,
}

/// Writes datasets through a [`Sink`] under an [`ImportSession`].
pub struct ImportWriter<S> {
    sink: S,
    title_filter: Box<dyn TextFilter>,
    body_filter: Box<dyn TextFilter>,
}

impl<S: Sink> ImportWriter<S> {
    /// Writer with markup stripped from titles and bodies left as is.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            title_filter: Box::new(StripMarkup),
            body_filter: Box::new(PassThrough),
        }
    }

    #[must_use]
    pub fn with_title_filter(mut self, filter: impl TextFilter + 'static) -> Self {
        self.title_filter = Box::new(filter);
        self
    }

    #[must_use]
    pub fn with_body_filter(mut self, filter: impl TextFilter + 'static) -> Self {
        self.body_filter = Box::new(filter);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Write `dataset` using `template`.
    ///
    /// Without `persist` nothing reaches the sink and any pending decision
    /// flag is consumed. With `persist`, a forced session first deletes the
    /// previous run's records, then one record is created per row and the
    /// session ledger is replaced by the new identifiers.
    pub fn write<L, F>(
        &mut self,
        session: &mut ImportSession<L, F>,
        dataset: &ImportDataset,
        template: &RecordTemplate,
        persist: bool,
    ) -> Result<WriteReport>
    where
        L: LedgerStore,
        F: FlagStore,
    {
        let span = info_span!("write", key = session.key(), rows = dataset.len(), persist);
        let _guard = span.enter();
        let start = Instant::now();

        if dataset.is_empty() {
            return Err(ImportError::EmptyDataset);
        }

        let previews = self.previews(dataset, template)?;

        if !persist {
            if matches!(session.state(), SessionState::Force | SessionState::Continue) {
                warn!(state = %session.state(), "dry run consumed the pending decision");
            }
            session.consume_flags()?;
            info!(records = previews.len(), "dry run complete");
            return Ok(WriteReport {
                mode: WriteMode::DryRun,
                previews,
                created: Vec::new(),
                deleted: Vec::new(),
                source_changed: false,
            });
        }

        let deleted = match session.state() {
            SessionState::Force => {
                let deleted = self.delete_previous(session, &template.record.kind)?;
                session.clear_flag(SessionFlag::Force)?;
                deleted
            }
            SessionState::Continue => {
                session.clear_flag(SessionFlag::Continue)?;
                Vec::new()
            }
            SessionState::Clean | SessionState::PendingDecision => Vec::new(),
        };

        let source_hash = if dataset.source().is_file() {
            Some(compute_file_hash(dataset.source())?)
        } else {
            None
        };
        let source_changed = match (
            session.previous_entry().and_then(|entry| entry.source_hash.as_deref()),
            source_hash.as_deref(),
        ) {
            (Some(previous), Some(current)) => previous != current,
            _ => false,
        };
        if source_changed {
            warn!(source = %dataset.source().display(), "source changed since the previous run");
        }

        let mut created = Vec::with_capacity(previews.len());
        for preview in &previews {
            let id = self.sink.create_record(&preview.to_new_record())?;
            for (key, value) in &preview.attributes {
                self.sink.set_attribute(id, key, value)?;
            }
            debug!(row = preview.row, id = %id, attributes = preview.attributes.len(), "record created");
            created.push(id);
        }

        let mut entry = LedgerEntry::new(dataset.source_name(), created.clone());
        entry.source_hash = source_hash;
        session.record_run(entry)?;

        info!(
            created = created.len(),
            deleted = deleted.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "import written"
        );

        Ok(WriteReport {
            mode: WriteMode::Persisted,
            previews,
            created,
            deleted,
            source_changed,
        })
    }

    fn delete_previous<L, F>(
        &mut self,
        session: &ImportSession<L, F>,
        kind: &str,
    ) -> Result<Vec<RecordId>>
    where
        L: LedgerStore,
        F: FlagStore,
    {
        let previous = session.previous_ids();
        if previous.is_empty() {
            return Ok(Vec::new());
        }
        if !self.sink.record_kind_exists(kind) {
            return Err(ImportError::UnknownRecordKind {
                kind: kind.to_string(),
            });
        }

        let mut deleted = Vec::new();
        for record in self.sink.list_records_by_ids(kind, previous)? {
            self.sink.delete_record(record.id)?;
            deleted.push(record.id);
        }
        info!(deleted = deleted.len(), previous = previous.len(), "previous records deleted");
        Ok(deleted)
    }

    fn previews(
        &self,
        dataset: &ImportDataset,
        template: &RecordTemplate,
    ) -> Result<Vec<RecordPreview>> {
        let spec = &template.record;
        let title_column = spec.title_column(dataset.tree());
        let body_column = spec.body_column();

        let mut previews = Vec::with_capacity(dataset.len());
        for row in 0..dataset.len() {
            let title = flatten(dataset, title_column, row)?;
            let body = flatten(dataset, body_column, row)?;

            let mut attributes = IndexMap::with_capacity(template.attributes.len());
            for (key, attribute) in &template.attributes {
                attributes.insert(key.clone(), resolve_attribute(dataset, attribute, row)?);
            }

            previews.push(RecordPreview {
                row,
                title: self.title_filter.apply(title),
                body: self.body_filter.apply(body),
                kind: spec.kind.clone(),
                status: spec.status.clone(),
                fields: spec.fields.clone(),
                attributes,
            });
        }
        Ok(previews)
    }
}

/// Text of `column` in `row`, list leaves joined with a space.
fn flatten(dataset: &ImportDataset, column: Option<&str>, row: usize) -> Result<String> {
    let Some(column) = column else {
        return Ok(String::new());
    };
    Ok(dataset
        .cell(column, row)?
        .map(|value| value.joined(FLATTEN_SEPARATOR))
        .unwrap_or_default())
}

fn resolve_attribute(
    dataset: &ImportDataset,
    attribute: &AttributeSpec,
    row: usize,
) -> Result<AttributeValue> {
    match attribute {
        AttributeSpec::Literal(value) => Ok(AttributeValue::Literal(value.clone())),
        AttributeSpec::Columns(entries) => {
            let mut bucket = IndexMap::with_capacity(entries.len());
            for (key, column) in entries {
                let value = dataset
                    .cell(column, row)?
                    .cloned()
                    .unwrap_or_else(CellValue::empty);
                bucket.insert(key.resolve(column).to_string(), value);
            }
            Ok(AttributeValue::Bucket(bucket))
        }
    }
}
