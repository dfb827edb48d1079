//! Import sessions.
//!
//! A session is keyed by the source file name. When the ledger already holds
//! identifiers from an earlier persisted run, the caller has to record a
//! [`Decision`] before the session can be opened:
//!
//! ```text
//! Clean ──(persisted run)──▶ PendingDecision ──force──▶ Force ──write──▶ Clean
//!   ▲                             │  └────continue──▶ Continue ──write──▶ Clean
//!   └───────────cancel────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::{ImportError, Result};
use crate::sink::RecordId;
use crate::store::{FlagStore, LedgerEntry, LedgerStore, SessionFlag};

/// Prefix of every session key.
pub const SESSION_KEY_PREFIX: &str = "rowport_import_";

/// Lowercase `name`, replace runs of non-alphanumerics with one `-` and
/// trim dashes from both ends.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Session key for a source file name.
pub fn session_key(source_file_name: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{}", slug(source_file_name))
}

/// Caller's answer to a pending decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Forget the previous run without touching its records.
    Cancel,
    /// Delete the previous run's records before writing.
    Force,
    /// Keep the previous run's records and write alongside them.
    Continue,
}

impl Decision {
    pub const ALL: [Decision; 3] = [Decision::Cancel, Decision::Force, Decision::Continue];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Force => "force",
            Self::Continue => "continue",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown decision '{0}' (expected cancel, force or continue)")]
pub struct ParseDecisionError(String);

impl FromStr for Decision {
    type Err = ParseDecisionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|decision| decision.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDecisionError(s.to_string()))
    }
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No previous identifiers.
    Clean,
    /// Previous identifiers and no decision yet.
    PendingDecision,
    /// Previous records will be deleted.
    Force,
    /// Previous records will be kept.
    Continue,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clean => "clean",
            Self::PendingDecision => "pending decision",
            Self::Force => "force",
            Self::Continue => "continue",
        };
        f.write_str(label)
    }
}

/// Read-only view of a session for status surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub key: String,
    pub state: SessionState,
    pub entry: Option<LedgerEntry>,
}

fn compute_state<L, F>(key: &str, ledger: &L, flags: &F) -> Result<(SessionState, Option<LedgerEntry>)>
where
    L: LedgerStore,
    F: FlagStore,
{
    let entry = ledger.load(key)?.filter(|entry| !entry.is_empty());
    let state = match entry {
        None => SessionState::Clean,
        Some(_) if flags.get(key, SessionFlag::Force)? => SessionState::Force,
        Some(_) if flags.get(key, SessionFlag::Continue)? => SessionState::Continue,
        Some(_) => SessionState::PendingDecision,
    };
    Ok((state, entry))
}

/// An opened import session over a ledger and a flag store.
#[derive(Debug)]
pub struct ImportSession<L, F> {
    key: String,
    ledger: L,
    flags: F,
    state: SessionState,
    entry: Option<LedgerEntry>,
}

impl<L: LedgerStore, F: FlagStore> ImportSession<L, F> {
    /// Record a decision for `key`. Applying the same decision twice has no
    /// further effect.
    pub fn decide(key: &str, ledger: &mut L, flags: &mut F, decision: Decision) -> Result<()> {
        match decision {
            Decision::Cancel => {
                ledger.delete(key)?;
                flags.clear_all(key)?;
            }
            Decision::Force => {
                flags.set(key, SessionFlag::Force)?;
                flags.clear(key, SessionFlag::Continue)?;
            }
            Decision::Continue => {
                flags.set(key, SessionFlag::Continue)?;
                flags.clear(key, SessionFlag::Force)?;
            }
        }
        info!(key, %decision, "session decision recorded");
        Ok(())
    }

    /// Current state of `key` without opening the session.
    pub fn inspect(key: &str, ledger: &L, flags: &F) -> Result<SessionStatus> {
        let (state, entry) = compute_state(key, ledger, flags)?;
        Ok(SessionStatus {
            key: key.to_string(),
            state,
            entry,
        })
    }

    /// Open the session for `key`.
    ///
    /// Fails with [`ImportError::PendingDecisionRequired`] while a previous
    /// run is recorded and no decision has been made.
    pub fn open(key: impl Into<String>, ledger: L, flags: F) -> Result<Self> {
        let key = key.into();
        let (state, entry) = compute_state(&key, &ledger, &flags)?;
        if state == SessionState::PendingDecision {
            let previous = entry.map(|entry| entry.record_ids).unwrap_or_default();
            return Err(ImportError::PendingDecisionRequired { key, previous });
        }
        info!(key = %key, %state, "session opened");
        Ok(Self {
            key,
            ledger,
            flags,
            state,
            entry,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identifiers recorded by the previous persisted run.
    pub fn previous_ids(&self) -> &[RecordId] {
        self.entry
            .as_ref()
            .map(|entry| entry.record_ids.as_slice())
            .unwrap_or_default()
    }

    pub fn previous_entry(&self) -> Option<&LedgerEntry> {
        self.entry.as_ref()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn flags(&self) -> &F {
        &self.flags
    }

    pub fn into_parts(self) -> (L, F) {
        (self.ledger, self.flags)
    }

    /// A dry run consumes whatever decision was pending.
    pub(crate) fn consume_flags(&mut self) -> Result<()> {
        self.flags.clear_all(&self.key)?;
        if matches!(self.state, SessionState::Force | SessionState::Continue) {
            self.state = SessionState::PendingDecision;
        }
        Ok(())
    }

    pub(crate) fn clear_flag(&mut self, flag: SessionFlag) -> Result<()> {
        self.flags.clear(&self.key, flag)?;
        Ok(())
    }

    /// Replace the ledger with this run's identifiers and close the cycle.
    pub(crate) fn record_run(&mut self, entry: LedgerEntry) -> Result<()> {
        self.ledger.save(&self.key, &entry)?;
        self.flags.clear_all(&self.key)?;
        self.entry = Some(entry);
        self.state = SessionState::Clean;
        Ok(())
    }
}
