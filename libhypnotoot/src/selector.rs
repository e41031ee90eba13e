//! Quote selection with repeat avoidance
//!
//! Quotes are drawn uniformly at random from the corpus. A draw that appears
//! in the recent history is rejected and redrawn, up to [`MAX_DRAWS`] times.
//! If every draw collides, the last one is used anyway: a repeat is better
//! than no post.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::corpus::{Quote, QuoteCorpus};
use crate::error::{CorpusError, Result};
use crate::history::HistoryStore;

/// Maximum number of random draws per selection
pub const MAX_DRAWS: usize = 250;

/// Number of recently used identifiers to remember
pub const HISTORY_LIMIT: usize = 50;

/// A selected quote together with the updated history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub quote_id: String,
    pub quote: Quote,
    /// History including `quote_id`, trimmed to [`HISTORY_LIMIT`]
    pub history: Vec<String>,
}

/// Pick a quote that is not in `history`, if possible
///
/// # Errors
///
/// Returns `CorpusError::Empty` if the corpus has no quotes.
pub fn select<R: Rng + ?Sized>(
    corpus: &QuoteCorpus,
    history: &[String],
    rng: &mut R,
) -> Result<Selection> {
    let ids = corpus.ids();

    let mut chosen = None;
    for _ in 0..MAX_DRAWS {
        let id = *ids.choose(rng).ok_or(CorpusError::Empty)?;
        chosen = Some(id);
        if !history.iter().any(|seen| seen == id) {
            break;
        }
    }
    let quote_id = chosen.ok_or(CorpusError::Empty)?;

    if history.iter().any(|seen| seen == quote_id) {
        debug!(
            "All {} draws were recently used; reusing \"{}\"",
            MAX_DRAWS, quote_id
        );
    }

    let quote = corpus.get(quote_id).cloned().ok_or(CorpusError::Empty)?;

    let mut updated = history.to_vec();
    updated.push(quote_id.to_string());
    let excess = updated.len().saturating_sub(HISTORY_LIMIT);
    updated.drain(..excess);

    Ok(Selection {
        quote_id: quote_id.to_string(),
        quote,
        history: updated,
    })
}

/// Select a quote and persist the updated history
///
/// The history is saved before anything is posted, so a failed post does not
/// bring the same quote back on the next run.
///
/// # Errors
///
/// Returns `CorpusError::Empty` for an empty corpus and `HistoryError::Write`
/// if the history cannot be saved. A history that cannot be loaded is treated
/// as empty.
pub fn select_and_record<R: Rng + ?Sized>(
    corpus: &QuoteCorpus,
    store: &dyn HistoryStore,
    rng: &mut R,
) -> Result<Selection> {
    let history = store.load();
    let selection = select(corpus, &history, rng)?;
    store.save(&selection.history)?;

    info!("Using quote \"{}\"", selection.quote_id);
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HypnotootError;
    use crate::history::MemoryHistoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corpus_of(size: usize) -> QuoteCorpus {
        (0..size)
            .map(|i| {
                (
                    format!("q{i:03}"),
                    Quote {
                        quote: format!("Quote number {i}"),
                        spoiler: None,
                    },
                )
            })
            .collect()
    }

    fn history_of(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("q{i:03}")).collect()
    }

    #[test]
    fn test_select_avoids_recent_history() {
        let corpus = corpus_of(60);
        let history = history_of(0..50);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = select(&corpus, &history, &mut rng).unwrap();
            assert!(
                !history.contains(&selection.quote_id),
                "seed {seed} picked recent quote {}",
                selection.quote_id
            );
        }
    }

    #[test]
    fn test_select_returns_matching_quote() {
        let corpus = corpus_of(10);
        let mut rng = StdRng::seed_from_u64(7);

        let selection = select(&corpus, &[], &mut rng).unwrap();
        assert_eq!(Some(&selection.quote), corpus.get(&selection.quote_id));
    }

    #[test]
    fn test_history_ends_with_selection_and_is_bounded() {
        let corpus = corpus_of(100);
        let history = history_of(0..50);
        let mut rng = StdRng::seed_from_u64(1);

        let selection = select(&corpus, &history, &mut rng).unwrap();

        assert_eq!(selection.history.len(), HISTORY_LIMIT);
        assert_eq!(selection.history.last(), Some(&selection.quote_id));
        // Oldest entry evicted first
        assert_eq!(selection.history[0], "q001");
        assert!(!selection.history.contains(&"q000".to_string()));
    }

    #[test]
    fn test_short_history_grows() {
        let corpus = corpus_of(100);
        let history = history_of(0..3);
        let mut rng = StdRng::seed_from_u64(2);

        let selection = select(&corpus, &history, &mut rng).unwrap();

        assert_eq!(selection.history.len(), 4);
        assert_eq!(&selection.history[..3], &history[..]);
    }

    #[test]
    fn test_oversized_history_is_trimmed() {
        let corpus = corpus_of(200);
        let history = history_of(0..80);
        let mut rng = StdRng::seed_from_u64(3);

        let selection = select(&corpus, &history, &mut rng).unwrap();

        assert_eq!(selection.history.len(), HISTORY_LIMIT);
        assert_eq!(selection.history.last(), Some(&selection.quote_id));
    }

    #[test]
    fn test_single_quote_already_used_is_reused() {
        let corpus = corpus_of(1);
        let history = history_of(0..1);
        let mut rng = StdRng::seed_from_u64(4);

        let selection = select(&corpus, &history, &mut rng).unwrap();

        assert_eq!(selection.quote_id, "q000");
        assert_eq!(selection.history, vec!["q000".to_string(), "q000".to_string()]);
    }

    #[test]
    fn test_fully_used_corpus_falls_back() {
        let corpus = corpus_of(5);
        let history = history_of(0..5);
        let mut rng = StdRng::seed_from_u64(5);

        let selection = select(&corpus, &history, &mut rng).unwrap();
        assert!(corpus.get(&selection.quote_id).is_some());
    }

    #[test]
    fn test_empty_corpus_fails() {
        let corpus = QuoteCorpus::default();
        let mut rng = StdRng::seed_from_u64(6);

        let result = select(&corpus, &[], &mut rng);
        assert!(matches!(
            result,
            Err(HypnotootError::Corpus(CorpusError::Empty))
        ));
    }

    #[test]
    fn test_select_and_record_persists_history() {
        let corpus = corpus_of(60);
        let store = MemoryHistoryStore::new(history_of(0..50));
        let mut rng = StdRng::seed_from_u64(8);

        let selection = select_and_record(&corpus, &store, &mut rng).unwrap();

        let stored = store.snapshot();
        assert_eq!(stored, selection.history);
        assert_eq!(stored.len(), HISTORY_LIMIT);
        assert_eq!(stored.last(), Some(&selection.quote_id));
        assert!(!history_of(0..50).contains(&selection.quote_id));
    }

    #[test]
    fn test_select_and_record_with_empty_store() {
        let corpus = corpus_of(3);
        let store = MemoryHistoryStore::default();
        let mut rng = StdRng::seed_from_u64(9);

        let selection = select_and_record(&corpus, &store, &mut rng).unwrap();
        assert_eq!(store.snapshot(), vec![selection.quote_id]);
    }
}
