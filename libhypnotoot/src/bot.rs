//! One bot run: select a quote, then publish it

use std::path::Path;

use rand::Rng;

use crate::corpus::QuoteCorpus;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::platforms::Platform;
use crate::publisher::{Publisher, RetryPolicy};
use crate::selector;

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub quote_id: String,
    pub post_id: String,
}

/// Select a quote from the corpus file and publish it
///
/// The history is updated before publishing and stays updated even if
/// publishing fails.
pub async fn run_once<R: Rng + ?Sized>(
    corpus_path: &Path,
    store: &dyn HistoryStore,
    platform: &dyn Platform,
    policy: RetryPolicy,
    rng: &mut R,
) -> Result<PostReceipt> {
    let corpus = QuoteCorpus::load(corpus_path)?;
    let selection = selector::select_and_record(&corpus, store, rng)?;

    let post_id = Publisher::with_policy(platform, policy)
        .publish(&selection.quote.quote, selection.quote.spoiler())
        .await?;

    Ok(PostReceipt {
        quote_id: selection.quote_id,
        post_id,
    })
}
