//! Import profiles: one JSON document describing a whole import.

use std::fs;
use std::path::{Path, PathBuf};

use rowport_ingest::ImportOptions;
use rowport_model::{ModelError, RecordTemplate, RuleTree};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Source, reading options, rule tree and record template of an import.
///
/// ```json
/// {
///   "source": "catalog.csv",
///   "delimiter": ";",
///   "start_row": 2,
///   "columns": { "name": 1, "tags": { "col": [3], "cell_separator": "," } },
///   "record": { "title": "name", "kind": "post" },
///   "attributes": { "tags": ["tags"] }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportProfile {
    /// Source file, relative to the profile's directory unless absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(flatten)]
    pub options: ImportOptions,
    pub columns: RuleTree,
    #[serde(flatten)]
    pub template: RecordTemplate,
}

impl ImportProfile {
    /// Load a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| StoreError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut profile = Self::from_json_str(&contents)?;
        if let Some(source) = profile.source.take() {
            profile.source = Some(resolve_relative(path, source));
        }
        Ok(profile)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(ModelError::from)?)
    }
}

fn resolve_relative(profile_path: &Path, source: PathBuf) -> PathBuf {
    if source.is_absolute() {
        return source;
    }
    match profile_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(source),
        _ => source,
    }
}
