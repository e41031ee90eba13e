//! Mock platform implementation for testing
//!
//! Replays a scripted sequence of outcomes and records every create-post
//! call, including when it happened on the tokio clock. Under a paused clock
//! the gaps between calls are exactly the publisher's backoff delays.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::platforms::Platform;
use crate::types::{PostOutcome, PostParams};

/// A recorded create-post call
#[derive(Debug, Clone)]
pub struct MockCall {
    pub params: PostParams,
    pub at: Instant,
}

/// Mock platform for testing
pub struct MockPlatform {
    name: String,

    /// Outcomes returned in order, one per call
    script: Mutex<VecDeque<PostOutcome>>,

    /// Outcome once the script runs out; `None` means a fresh post ID
    fallback: Option<PostOutcome>,

    calls: Arc<Mutex<Vec<MockCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockPlatform {
    /// Create a mock platform that replays `script`, then succeeds
    pub fn scripted(name: &str, script: Vec<PostOutcome>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            fallback: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock platform that always succeeds
    pub fn success(name: &str) -> Self {
        Self::scripted(name, Vec::new())
    }

    /// Create a mock platform that returns `outcome` on every call
    pub fn always(name: &str, outcome: PostOutcome) -> Self {
        Self {
            fallback: Some(outcome),
            ..Self::scripted(name, Vec::new())
        }
    }

    /// Get the number of times create_post was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Time elapsed between consecutive calls
    pub fn call_gaps(&self) -> Vec<Duration> {
        lock(&self.calls)
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn create_post(&self, params: &PostParams) -> PostOutcome {
        let call_number = {
            let mut calls = lock(&self.calls);
            calls.push(MockCall {
                params: params.clone(),
                at: Instant::now(),
            });
            calls.len()
        };

        if let Some(outcome) = lock(&self.script).pop_front() {
            return outcome;
        }

        match &self.fallback {
            Some(outcome) => outcome.clone(),
            None => PostOutcome::Posted(format!("{}:{}", self.name, call_number)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
