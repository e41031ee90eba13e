//! Quote corpus loading
//!
//! The corpus is a JSON object mapping quote identifiers to quote records:
//!
//! ```json
//! {
//!   "tutorial-1": { "quote": "Welcome to Hypnospace!" },
//!   "finale": { "quote": "...", "spoiler": "ending spoilers" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result};

/// A single quote record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    #[serde(default)]
    pub spoiler: Option<String>,
}

impl Quote {
    /// Content warning text, if any. Empty warnings count as none.
    pub fn spoiler(&self) -> Option<&str> {
        self.spoiler.as_deref().filter(|s| !s.is_empty())
    }
}

/// Immutable mapping from quote identifier to quote record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteCorpus {
    quotes: BTreeMap<String, Quote>,
}

impl QuoteCorpus {
    pub fn new(quotes: BTreeMap<String, Quote>) -> Self {
        Self { quotes }
    }

    /// Load a corpus from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::Unavailable` if the file cannot be read or parsed,
    /// and `CorpusError::Empty` if it holds no quotes.
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| CorpusError::Unavailable {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let corpus: QuoteCorpus =
            serde_json::from_str(&content).map_err(|e| unavailable(e.to_string()))?;

        if corpus.is_empty() {
            return Err(CorpusError::Empty.into());
        }

        tracing::debug!("Loaded {} quotes from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn get(&self, id: &str) -> Option<&Quote> {
        self.quotes.get(id)
    }

    /// Quote identifiers in stable (sorted) order
    pub fn ids(&self) -> Vec<&str> {
        self.quotes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<(String, Quote)> for QuoteCorpus {
    fn from_iter<I: IntoIterator<Item = (String, Quote)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
