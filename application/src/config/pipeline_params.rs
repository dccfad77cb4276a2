//! Pipeline parameters: prompt budgets and retry policy.
//!
//! [`PipelineParams`] is an explicit value handed to every use case; there is
//! no process-wide configuration state.

use std::time::Duration;

/// Bounded retry with linear backoff for backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per prompt, including the first one (at least 1).
    pub max_attempts: u32,
    /// Delay before the second attempt; grows linearly with each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Never retry
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

/// Parameters shared by the analysis and defense stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineParams {
    /// Characters of document text included in each question prompt.
    pub document_char_budget: usize,
    /// Characters of analysis digest included in each defense prompt.
    pub summary_char_budget: usize,
    pub retry: RetryPolicy,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            document_char_budget: 4000,
            summary_char_budget: 6000,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineParams {
    pub fn with_document_char_budget(mut self, chars: usize) -> Self {
        self.document_char_budget = chars;
        self
    }

    pub fn with_summary_char_budget(mut self, chars: usize) -> Self {
        self.summary_char_budget = chars;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
