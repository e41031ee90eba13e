//! Remote posting clients
//!
//! The publisher talks to a [`Platform`], which turns post parameters into a
//! single create-post call and reports how it went as a [`PostOutcome`].
//!
//! # Examples
//!
//! ```no_run
//! use libhypnotoot::platforms::{mastodon::MastodonClient, Platform};
//! use libhypnotoot::config::MastodonConfig;
//! use libhypnotoot::{PostOutcome, PostParams};
//!
//! # async fn example() -> libhypnotoot::Result<()> {
//! let config = MastodonConfig {
//!     api_base_url: "https://botsin.space".to_string(),
//!     token_file: "~/.config/hypnotoot/token".to_string(),
//! };
//! let client = MastodonClient::from_config(&config)?;
//!
//! let params = PostParams::for_quote("Welcome to Hypnospace!", None);
//! match client.create_post(&params).await {
//!     PostOutcome::Posted(id) => println!("Posted: {}", id),
//!     other => eprintln!("Not posted: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::types::{PostOutcome, PostParams};

pub mod mastodon;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// A service that can create posts
#[async_trait]
pub trait Platform: Send + Sync {
    /// Create one post
    ///
    /// Performs exactly one remote call. Failures are classified rather than
    /// returned as errors so the caller can decide whether to retry.
    async fn create_post(&self, params: &PostParams) -> PostOutcome;

    /// Lowercase platform identifier (e.g., "mastodon")
    fn name(&self) -> &str;
}
