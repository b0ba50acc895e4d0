//! Append-only break log.
//!
//! Stored as a JSON array of `{ "t": <epoch-ms>, "type": "break" | "longbreak" }`
//! under [`super::LOG_KEY`]. Insertion order is chronological order; entries
//! are never edited, only cleared wholesale.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::kv::KvStore;
use super::LOG_KEY;
use crate::error::Result;

/// Which kind of break a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Break,
    LongBreak,
}

impl BreakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Break => "break",
            Self::LongBreak => "longbreak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Epoch milliseconds.
    pub t: i64,
    #[serde(rename = "type")]
    pub kind: BreakKind,
}

impl LogEntry {
    pub fn new(t: i64, kind: BreakKind) -> Self {
        Self { t, kind }
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.t).single()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load from storage; missing or unparseable data is an empty log.
    pub fn load(store: &dyn KvStore) -> Self {
        match store.get(LOG_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LogEntry>>(&raw) {
                Ok(entries) => Self { entries },
                Err(e) => {
                    tracing::warn!("break log corrupt, starting empty: {e}");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("break log unreadable, starting empty: {e}");
                Self::default()
            }
        }
    }

    /// Persist the whole log.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        store.set(LOG_KEY, &json)?;
        Ok(())
    }
}
