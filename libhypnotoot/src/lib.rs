//! Hypnotoot - a quote bot for the Fediverse
//!
//! This library picks a quote from a curated corpus, avoiding recently used
//! ones, and publishes it to a Mastodon-compatible instance with bounded
//! retries.

pub mod bot;
pub mod config;
pub mod corpus;
pub mod error;
pub mod history;
pub mod logging;
pub mod platforms;
pub mod publisher;
pub mod selector;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use corpus::{Quote, QuoteCorpus};
pub use error::{HypnotootError, Result};
pub use history::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use publisher::{Publisher, RetryPolicy};
pub use selector::Selection;
pub use types::{PostOutcome, PostParams, Visibility};
