//! In-memory stores.

use std::collections::{HashMap, HashSet};

use super::{FlagStore, LedgerEntry, LedgerStore, Result, SessionFlag};

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedger {
    fn load(&self, key: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, entry: &LedgerEntry) -> Result<()> {
        self.entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFlags {
    flags: HashSet<(String, SessionFlag)>,
    return_to: Option<String>,
}

impl MemoryFlags {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlags {
    fn get(&self, key: &str, flag: SessionFlag) -> Result<bool> {
        Ok(self.flags.contains(&(key.to_string(), flag)))
    }

    fn set(&mut self, key: &str, flag: SessionFlag) -> Result<()> {
        self.flags.insert((key.to_string(), flag));
        Ok(())
    }

    fn clear(&mut self, key: &str, flag: SessionFlag) -> Result<()> {
        self.flags.remove(&(key.to_string(), flag));
        Ok(())
    }

    fn return_to(&self) -> Result<Option<String>> {
        Ok(self.return_to.clone())
    }

    fn set_return_to(&mut self, location: Option<String>) -> Result<()> {
        self.return_to = location;
        Ok(())
    }
}
