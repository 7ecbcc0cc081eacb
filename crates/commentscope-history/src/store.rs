//! File-backed history store
//!
//! The whole log lives in one JSON array, newest first, rewritten on every
//! mutation. Mutations are serialised through a single mutex so concurrent
//! requests within the process cannot lose updates. Each rewrite goes to a
//! sibling temp file that is renamed over the log, so readers only ever see
//! a complete file.

use crate::entry::HistoryEntry;
use crate::stats::HistoryStats;
use commentscope_core::{Error, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of retained entries
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Rolling prediction log persisted to a single JSON file
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    limit: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store with the default 50-entry limit
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limit(path, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Read the whole log
    ///
    /// An absent, unreadable or unparsable file yields an empty log.
    pub fn load(&self) -> Vec<HistoryEntry> {
        if !self.path.exists() {
            return Vec::new();
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Error loading history from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error parsing history in {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Overwrite the file with `entries`, pretty-printed with 2-space indent
    pub fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write_entries(entries)
    }

    /// Caller must hold `write_lock`
    fn write_entries(&self, entries: &[HistoryEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::history(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let write_error = |e: std::io::Error| {
            Error::history(format!("Failed to write {}: {}", self.path.display(), e))
        };

        let temp_path = self.temp_path().ok_or_else(|| {
            Error::history(format!("Failed to write {}: not a file path", self.path.display()))
        })?;
        std::fs::write(&temp_path, json).map_err(write_error)?;
        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(write_error(e));
        }

        metrics::counter!("commentscope_history_writes_total").increment(1);
        debug!(entries = entries.len(), path = %self.path.display(), "History saved");
        Ok(())
    }

    fn temp_path(&self) -> Option<PathBuf> {
        let mut name = self.path.file_name()?.to_os_string();
        name.push(".tmp");
        Some(self.path.with_file_name(name))
    }

    /// Record a prediction at the head of the log
    ///
    /// The new id is the log length plus one; the log is then trimmed to the
    /// configured limit, dropping the oldest entries.
    pub fn append(
        &self,
        comment: &str,
        emotion: &str,
        sentiment: &str,
        like_count: &str,
    ) -> Result<HistoryEntry> {
        let _guard = self.write_lock.lock();

        let mut entries = self.load();
        let id = entries.len() as u64 + 1;
        let entry = HistoryEntry::new(id, comment, emotion, sentiment, like_count);

        entries.insert(0, entry.clone());
        entries.truncate(self.limit);
        self.write_entries(&entries)?;

        debug!(id, total = entries.len(), "Appended history entry");
        Ok(entry)
    }

    /// Remove every entry with `id`; no match is a no-op
    pub fn delete(&self, id: u64) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            debug!(id, "No history entry to delete");
        }
        self.write_entries(&entries)
    }

    /// Replace the log with an empty one
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write_entries(&[])
    }

    /// Label counts over the whole log
    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_entries(&self.load())
    }
}
