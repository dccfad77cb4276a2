//! Analysis configuration from TOML (`[analysis]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use themis_application::{PipelineParams, RetryPolicy};

/// Raw analysis configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnalysisConfig {
    /// Characters of document text sent with each question
    pub document_char_budget: usize,
    /// Characters of analysis sent with each defense prompt
    pub summary_char_budget: usize,
    /// Attempts per backend call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; grows linearly
    pub retry_backoff_ms: u64,
    /// HTTP timeout for a single backend call
    pub request_timeout_secs: u64,
}

impl Default for FileAnalysisConfig {
    fn default() -> Self {
        let params = PipelineParams::default();
        Self {
            document_char_budget: params.document_char_budget,
            summary_char_budget: params.summary_char_budget,
            max_attempts: params.retry.max_attempts,
            retry_backoff_ms: params.retry.backoff.as_millis() as u64,
            request_timeout_secs: 300,
        }
    }
}

impl FileAnalysisConfig {
    pub fn to_params(&self) -> PipelineParams {
        PipelineParams::default()
            .with_document_char_budget(self.document_char_budget)
            .with_summary_char_budget(self.summary_char_budget)
            .with_retry(RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.retry_backoff_ms),
            ))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
