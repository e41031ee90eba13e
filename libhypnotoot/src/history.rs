//! Recent-history storage
//!
//! The selector only needs to load and save the list of recently used quote
//! identifiers. [`JsonHistoryStore`] keeps it in a small JSON file between
//! runs; [`MemoryHistoryStore`] keeps it in memory for tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{HistoryError, Result};

/// Persistence for the recent-history list
pub trait HistoryStore {
    /// Load the stored history, oldest first
    ///
    /// Never fails: an absent or unreadable history is an empty one.
    fn load(&self) -> Vec<String>;

    /// Replace the stored history
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Write` if the history cannot be persisted.
    fn save(&self, ids: &[String]) -> Result<()>;
}

/// History kept as a JSON array of identifiers on disk
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Vec<String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No history at {}, starting fresh", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "Could not read history {}: {}. Starting fresh",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    "Could not parse history {}: {}. Starting fresh",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn save(&self, ids: &[String]) -> Result<()> {
        let write_error = |reason: String| HistoryError::Write {
            path: self.path.clone(),
            reason,
        };

        let content = serde_json::to_string(ids).map_err(|e| write_error(e.to_string()))?;

        // Replaced by rename; the file is never seen half-written
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| write_error(e.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| write_error(e.to_string()))?;
        temp.persist(&self.path)
            .map_err(|e| write_error(e.error.to_string()))?;

        debug!("Saved {} history entries to {}", ids.len(), self.path.display());
        Ok(())
    }
}

/// In-memory history, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    ids: Mutex<Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            ids: Mutex::new(ids),
        }
    }

    /// Current contents of the store
    pub fn snapshot(&self) -> Vec<String> {
        match self.ids.lock() {
            Ok(ids) => ids.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Vec<String> {
        self.snapshot()
    }

    fn save(&self, ids: &[String]) -> Result<()> {
        let mut stored = match self.ids.lock() {
            Ok(stored) => stored,
            Err(poisoned) => poisoned.into_inner(),
        };
        *stored = ids.to_vec();
        Ok(())
    }
}
