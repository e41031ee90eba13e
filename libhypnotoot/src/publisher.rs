//! Posting with bounded retries
//!
//! Each run makes at most [`RetryPolicy::max_attempts`] create-post calls.
//! Rate limits back off exponentially, generic service errors back off
//! linearly, and anything unexpected aborts immediately. There is no sleep
//! after the final attempt.
//!
//! ```text
//! Idle -> Attempting -> Success
//!              |   ^
//!              v   |
//!             Backoff
//!              |
//!              +-> FatalAbort (unexpected failure or attempts exhausted)
//! ```

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{PostOutcome, PostParams};

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after a rate limit on zero-based `attempt`: base * 2^attempt
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Delay after a service error on zero-based `attempt`: base * (attempt + 1)
    pub fn service_error_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Delay before retrying after `outcome`, or `None` if the run should stop
    pub fn backoff(&self, outcome: &PostOutcome, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        match outcome {
            PostOutcome::RateLimited(_) => Some(self.rate_limit_delay(attempt)),
            PostOutcome::ServiceError(_) => Some(self.service_error_delay(attempt)),
            PostOutcome::Posted(_) | PostOutcome::Unexpected(_) => None,
        }
    }
}

/// Publishes quotes through a platform, retrying recoverable failures
pub struct Publisher<'a> {
    platform: &'a dyn Platform,
    policy: RetryPolicy,
}

impl<'a> Publisher<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self::with_policy(platform, RetryPolicy::default())
    }

    pub fn with_policy(platform: &'a dyn Platform, policy: RetryPolicy) -> Self {
        Self { platform, policy }
    }

    /// Post a quote, with an optional content warning
    ///
    /// Returns the platform post ID.
    ///
    /// # Errors
    ///
    /// - `PlatformError::Unexpected` on the first unexpected failure
    /// - `PlatformError::RetriesExhausted` when every attempt hit a rate limit
    ///   or service error
    pub async fn publish(&self, quote: &str, spoiler: Option<&str>) -> Result<String> {
        let params = PostParams::for_quote(quote, spoiler);
        let platform = self.platform.name();

        for attempt in 0..self.policy.max_attempts {
            info!("Attempting to post \"{}\"", quote);

            let outcome = self.platform.create_post(&params).await;
            match &outcome {
                PostOutcome::Posted(post_id) => {
                    info!("Posted to {} as {}", platform, post_id);
                    return Ok(post_id.clone());
                }
                PostOutcome::Unexpected(detail) => {
                    error!("Got unexpected error from {}: {}", platform, detail);
                    return Err(PlatformError::Unexpected(detail.clone()).into());
                }
                PostOutcome::RateLimited(detail) => match self.policy.backoff(&outcome, attempt) {
                    Some(delay) => {
                        info!(
                            "Got rate limited, trying again in {}",
                            humantime::format_duration(delay)
                        );
                        sleep(delay).await;
                    }
                    None => warn!("Got rate limited on final attempt: {}", detail),
                },
                PostOutcome::ServiceError(detail) => match self.policy.backoff(&outcome, attempt) {
                    Some(delay) => {
                        error!(
                            "Got unexpected {} error, trying again in {}: {}",
                            platform,
                            humantime::format_duration(delay),
                            detail
                        );
                        sleep(delay).await;
                    }
                    None => warn!("Got {} error on final attempt: {}", platform, detail),
                },
            }
        }

        error!(
            "Could not post to {} after {} attempts, exiting.",
            platform, self.policy.max_attempts
        );
        Err(PlatformError::RetriesExhausted {
            attempts: self.policy.max_attempts,
        }
        .into())
    }
}
