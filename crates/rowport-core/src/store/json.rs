//! JSON file stores.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{FlagStore, LedgerEntry, LedgerStore, Result, SessionFlag};
use crate::error::StoreError;
use crate::io::{read_json, remove_file, write_json_atomic};

/// Ledger stored as one `<key>.json` file per session under a directory.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    base_dir: PathBuf,
}

impl JsonLedger {
    /// Open a ledger at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| StoreError::Io {
            operation: "create directory",
            path: base_dir.clone(),
            source: e,
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// All stored entries with their keys, sorted by key.
    ///
    /// Files that do not parse as ledger entries are skipped.
    pub fn list(&self) -> Result<Vec<(String, LedgerEntry)>> {
        let read_dir = fs::read_dir(&self.base_dir).map_err(|e| StoreError::Io {
            operation: "read",
            path: self.base_dir.clone(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::Io {
                operation: "read",
                path: self.base_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let Some(key) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                continue;
            };
            if let Ok(Some(ledger)) = read_json::<LedgerEntry>(&path) {
                entries.push((key.to_string(), ledger));
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_key(key)))
    }
}

impl LedgerStore for JsonLedger {
    fn load(&self, key: &str) -> Result<Option<LedgerEntry>> {
        read_json(&self.entry_path(key))
    }

    fn save(&mut self, key: &str, entry: &LedgerEntry) -> Result<()> {
        let path = self.entry_path(key);
        write_json_atomic(&path, entry)?;
        tracing::debug!(key, path = %path.display(), records = entry.record_ids.len(), "ledger saved");
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        remove_file(&self.entry_path(key))
    }
}

/// Normalize a key for use in filenames.
fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct FlagPair {
    force: bool,
    #[serde(rename = "continue")]
    continue_: bool,
}

impl FlagPair {
    fn slot(&mut self, flag: SessionFlag) -> &mut bool {
        match flag {
            SessionFlag::Force => &mut self.force,
            SessionFlag::Continue => &mut self.continue_,
        }
    }

    fn is_clear(self) -> bool {
        !self.force && !self.continue_
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct FlagFile {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    sessions: BTreeMap<String, FlagPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_to: Option<String>,
}

impl FlagFile {
    fn get(&self, key: &str, flag: SessionFlag) -> bool {
        let mut pair = self.sessions.get(key).copied().unwrap_or_default();
        *pair.slot(flag)
    }

    fn put(&mut self, key: &str, flag: SessionFlag, value: bool) {
        let pair = self.sessions.entry(key.to_string()).or_default();
        *pair.slot(flag) = value;
        if pair.is_clear() {
            self.sessions.remove(key);
        }
    }
}

/// Flags of every session in a single JSON file:
///
/// ```json
/// { "sessions": { "rowport_import_catalog-csv": { "force": true, "continue": false } } }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFlags {
    path: PathBuf,
}

impl JsonFlags {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<FlagFile> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn update(&mut self, change: impl FnOnce(&mut FlagFile)) -> Result<()> {
        let mut file = self.read()?;
        let before = file.clone();
        change(&mut file);
        if file == before {
            return Ok(());
        }
        write_json_atomic(&self.path, &file)
    }
}

impl FlagStore for JsonFlags {
    fn get(&self, key: &str, flag: SessionFlag) -> Result<bool> {
        Ok(self.read()?.get(key, flag))
    }

    fn set(&mut self, key: &str, flag: SessionFlag) -> Result<()> {
        self.update(|file| file.put(key, flag, true))
    }

    fn clear(&mut self, key: &str, flag: SessionFlag) -> Result<()> {
        self.update(|file| file.put(key, flag, false))
    }

    fn return_to(&self) -> Result<Option<String>> {
        Ok(self.read()?.return_to)
    }

    fn set_return_to(&mut self, location: Option<String>) -> Result<()> {
        self.update(|file| file.return_to = location)
    }
}
