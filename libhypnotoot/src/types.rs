//! Core types for Hypnotoot

use serde::{Deserialize, Serialize};

/// Hashtags appended to public posts
pub const HASHTAGS: &str = "#hypnospace #hypnospaceoutlaw";

/// Who can see a post
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Unlisted => write!(f, "unlisted"),
        }
    }
}

/// Parameters for a single create-post call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostParams {
    pub status: String,
    pub visibility: Visibility,
    pub spoiler_text: Option<String>,
}

impl PostParams {
    /// Build post parameters for a quote
    ///
    /// A quote with a content warning is posted unlisted, behind the warning,
    /// and without hashtags. Everything else is posted publicly with
    /// [`HASHTAGS`] appended after a blank line.
    pub fn for_quote(quote: &str, spoiler: Option<&str>) -> Self {
        match spoiler.filter(|s| !s.is_empty()) {
            Some(spoiler) => Self {
                status: quote.to_string(),
                visibility: Visibility::Unlisted,
                spoiler_text: Some(spoiler.to_string()),
            },
            None => Self {
                status: format!("{}\n\n{}", quote, HASHTAGS),
                visibility: Visibility::Public,
                spoiler_text: None,
            },
        }
    }
}

/// Result of one create-post call
///
/// Rate limits and service errors are recoverable and drive the publisher's
/// backoff. Anything `Unexpected` aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The post was created; carries the platform post ID
    Posted(String),
    RateLimited(String),
    ServiceError(String),
    Unexpected(String),
}

impl PostOutcome {
    /// Whether a later attempt might succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PostOutcome::RateLimited(_) | PostOutcome::ServiceError(_))
    }
}
