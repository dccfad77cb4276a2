//! Shared utilities for use cases.
//!
//! Contains cancellation checking and the retrying backend call used by both
//! the document analyzer and the defense synthesizer.

use crate::config::RetryPolicy;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use themis_domain::Model;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Marker returned when cancellation has been requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Outcome of a failed [`complete_with_retry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallError {
    Cancelled,
    Gateway(GatewayError),
}

impl From<Cancelled> for CallError {
    fn from(_: Cancelled) -> Self {
        CallError::Cancelled
    }
}

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), Cancelled> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(Cancelled);
    }
    Ok(())
}

/// Send one prompt, retrying transient failures with the same prompt.
///
/// Blank completions count as [`GatewayError::EmptyResponse`]. Cancellation
/// interrupts both an in-flight request and the backoff sleep.
pub(crate) async fn complete_with_retry(
    gateway: &dyn LlmGateway,
    model: &Model,
    prompt: &str,
    retry: &RetryPolicy,
    progress: &dyn ProgressNotifier,
    cancellation_token: &Option<CancellationToken>,
) -> Result<String, CallError> {
    let mut attempt = 1;
    loop {
        check_cancelled(cancellation_token)?;

        let result = match cancellation_token {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(CallError::Cancelled),
                    result = gateway.complete(model, prompt) => result,
                }
            }
            None => gateway.complete(model, prompt).await,
        };

        let error = match result {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => GatewayError::EmptyResponse,
            Err(e) => e,
        };

        if !error.is_retryable() || attempt >= retry.max_attempts {
            debug!(model = %model, attempt, "Giving up: {}", error);
            return Err(CallError::Gateway(error));
        }

        let delay = retry.delay_after(attempt);
        warn!(
            model = %model,
            attempt,
            max_attempts = retry.max_attempts,
            "Backend call failed, retrying in {:?}: {}",
            delay,
            error
        );
        progress.on_progress(&ProgressEvent::RetryScheduled {
            attempt,
            max_attempts: retry.max_attempts,
            delay,
            reason: error.to_string(),
        });

        match cancellation_token {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(CallError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
        attempt += 1;
    }
}
