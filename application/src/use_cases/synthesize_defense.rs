//! Synthesize Defense use case
//!
//! Turns a case analysis into the three defense documents. Sections are
//! generated one after another and fail independently.

use crate::config::PipelineParams;
use crate::ports::call_logger::{CallEvent, CallLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use crate::use_cases::shared::{CallError, Cancelled, check_cancelled, complete_with_retry};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use themis_domain::{
    CaseAnalysisArtifact, DefenseArtifact, DefenseKind, DefenseSection, Model, PromptTemplate,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that can occur during defense synthesis
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefenseError {
    #[error("All defense sections failed: {0}")]
    BackendFailure(GatewayError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DefenseError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<Cancelled> for DefenseError {
    fn from(_: Cancelled) -> Self {
        DefenseError::Cancelled
    }
}

/// Use case for generating strategy, action items and timeline
pub struct SynthesizeDefenseUseCase {
    gateway: Arc<dyn LlmGateway>,
    call_logger: Arc<dyn CallLogger>,
    params: PipelineParams,
    cancellation_token: Option<CancellationToken>,
}

impl SynthesizeDefenseUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        call_logger: Arc<dyn CallLogger>,
        params: PipelineParams,
        cancellation_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            gateway,
            call_logger,
            params,
            cancellation_token,
        }
    }

    pub async fn synthesize(
        &self,
        artifact: &CaseAnalysisArtifact,
        model: &Model,
        progress: &dyn ProgressNotifier,
    ) -> Result<DefenseArtifact, DefenseError> {
        let digest = PromptTemplate::analysis_digest(artifact, self.params.summary_char_budget);

        let (strategy, strategy_error) = self
            .generate(DefenseKind::Strategy, &digest, model, progress)
            .await?;
        let (action_items, action_items_error) = self
            .generate(DefenseKind::ActionItems, &digest, model, progress)
            .await?;
        let (timeline, timeline_error) = self
            .generate(DefenseKind::Timeline, &digest, model, progress)
            .await?;

        if let (Some(_), Some(_), Some(error)) = (strategy_error, action_items_error, timeline_error)
        {
            return Err(DefenseError::BackendFailure(error));
        }

        Ok(DefenseArtifact {
            strategy,
            action_items,
            timeline,
        })
    }

    /// Generate one section; a backend failure yields a placeholder section
    /// together with the error that caused it.
    async fn generate(
        &self,
        kind: DefenseKind,
        digest: &str,
        model: &Model,
        progress: &dyn ProgressNotifier,
    ) -> Result<(DefenseSection, Option<GatewayError>), DefenseError> {
        check_cancelled(&self.cancellation_token)?;
        progress.on_progress(&ProgressEvent::DefenseSectionStarted { kind });

        let started = Instant::now();
        let prompt = PromptTemplate::defense(kind, digest);
        match complete_with_retry(
            self.gateway.as_ref(),
            model,
            &prompt,
            &self.params.retry,
            progress,
            &self.cancellation_token,
        )
        .await
        {
            Ok(content) => {
                let elapsed = started.elapsed();
                info!(model = %model, section = kind.as_str(), "Generated in {:?}", elapsed);
                self.call_logger.log(CallEvent::new(
                    "defense_generated",
                    json!({
                        "section": kind.as_str(),
                        "model": model.as_str(),
                        "prompt_chars": prompt.chars().count(),
                        "content_chars": content.chars().count(),
                        "elapsed_ms": elapsed.as_millis() as u64,
                    }),
                ));
                progress.on_progress(&ProgressEvent::DefenseSectionCompleted { kind, elapsed });
                Ok((DefenseSection::generated(kind, content.trim()), None))
            }
            Err(CallError::Cancelled) => Err(DefenseError::Cancelled),
            Err(CallError::Gateway(error)) => {
                warn!(model = %model, section = kind.as_str(), "Generation failed: {}", error);
                self.call_logger.log(CallEvent::new(
                    "defense_failed",
                    json!({
                        "section": kind.as_str(),
                        "model": model.as_str(),
                        "error": error.to_string(),
                        "elapsed_ms": started.elapsed().as_millis() as u64,
                    }),
                ));
                progress.on_progress(&ProgressEvent::DefenseSectionFailed {
                    kind,
                    reason: error.to_string(),
                });
                Ok((DefenseSection::failed(kind, error.to_string()), Some(error)))
            }
        }
    }
}
