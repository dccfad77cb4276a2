//! Run All Models use case
//!
//! Runs the full pipeline once per model, isolating failures per model, and
//! writes the cross-model comparison summary.

use crate::config::PipelineParams;
use crate::ports::PipelinePorts;
use crate::ports::artifact_store::PersistenceError;
use crate::ports::document_source::DocumentListError;
use crate::ports::llm_gateway::GatewayError;
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use crate::use_cases::run_pipeline::{FullProcessInput, RunPipelineUseCase};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use themis_domain::{
    ComparisonRow, ComparisonSummary, DomainError, Model, RunLinks, comparison_summary_path,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const CANCELLED_REASON: &str = "cancelled";

/// Errors that abort a batch before any model runs
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No PDF documents found in {}", .0.display())]
    NoDocumentsFound(PathBuf),

    #[error(transparent)]
    DocumentListing(#[from] DocumentListError),

    #[error("Could not discover models: {0}")]
    Discovery(GatewayError),

    #[error("The backend lists no models")]
    NoModels,

    #[error("Could not write comparison summary: {0}")]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    InvalidState(#[from] DomainError),
}

/// Input for the RunAllModels use case
#[derive(Debug, Clone)]
pub struct RunAllModelsInput {
    pub case_dir: PathBuf,
    /// Explicit models in run order; `None` discovers them from the backend
    pub models: Option<Vec<Model>>,
    pub questions_path: Option<PathBuf>,
    pub date: NaiveDate,
}

impl RunAllModelsInput {
    pub fn new(case_dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            case_dir: case_dir.into(),
            models: None,
            questions_path: None,
            date,
        }
    }

    pub fn with_models(mut self, models: Option<Vec<Model>>) -> Self {
        self.models = models;
        self
    }

    pub fn with_questions(mut self, path: Option<PathBuf>) -> Self {
        self.questions_path = path;
        self
    }
}

/// Output of a batch run
#[derive(Debug, Clone)]
pub struct RunAllModelsOutput {
    pub summary: ComparisonSummary,
    pub summary_path: PathBuf,
    /// The batch was interrupted; remaining rows are marked cancelled
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// A model scheduled for the batch.
///
/// `resolved` is the name the backend serves it under, or `None` when the
/// backend does not know the model.
struct Planned {
    requested: Model,
    resolved: Option<Model>,
}

/// Use case for running every model over one case
pub struct RunAllModelsUseCase {
    ports: PipelinePorts,
    params: PipelineParams,
    cancellation_token: Option<CancellationToken>,
}

impl RunAllModelsUseCase {
    pub fn new(ports: PipelinePorts, params: PipelineParams) -> Self {
        Self {
            ports,
            params,
            cancellation_token: None,
        }
    }

    /// Set a cancellation token for graceful interruption.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(
        &self,
        input: RunAllModelsInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<RunAllModelsOutput, BatchError> {
        let started = Instant::now();

        let documents = self.ports.documents.list_documents(&input.case_dir).await?;
        if documents.is_empty() {
            return Err(BatchError::NoDocumentsFound(input.case_dir));
        }

        let plan = self.plan(input.models).await?;
        info!(
            models = plan.len(),
            documents = documents.len(),
            "Starting batch run"
        );

        let mut pipeline = RunPipelineUseCase::new(self.ports.clone(), self.params.clone());
        if let Some(token) = &self.cancellation_token {
            pipeline = pipeline.with_cancellation(token.clone());
        }

        let total = plan.len();
        let mut rows = Vec::with_capacity(total);
        let mut cancelled = false;

        for (index, planned) in plan.into_iter().enumerate() {
            cancelled = cancelled || self.is_cancelled();

            let Some(model) = planned.resolved else {
                let mut row = ComparisonRow::pending(planned.requested.clone());
                let reason = if cancelled {
                    CANCELLED_REASON.to_string()
                } else {
                    format!("model '{}' is not available on the backend", planned.requested)
                };
                row.fail(&reason, None)?;
                self.notify_finished(progress, &row, Duration::ZERO);
                rows.push(row);
                continue;
            };

            let mut row = ComparisonRow::pending(model.clone());
            if cancelled {
                row.fail(CANCELLED_REASON, None)?;
                rows.push(row);
                continue;
            }

            row.start()?;
            progress.on_progress(&ProgressEvent::ModelStarted {
                index: index + 1,
                total,
                model: model.clone(),
            });

            let model_started = Instant::now();
            let run_input = FullProcessInput::new(&input.case_dir, model.clone(), input.date)
                .with_questions(input.questions_path.clone());
            let result = pipeline.full_process(run_input, progress).await;
            let elapsed = model_started.elapsed();

            match result {
                Ok(output) => {
                    info!(model = %model, "Model finished in {:?}", elapsed);
                    row.succeed(elapsed, RunLinks::for_layout(&output.layout))?;
                }
                Err(e) if e.is_cancelled() => {
                    warn!(model = %model, "Cancelled");
                    cancelled = true;
                    row.fail(CANCELLED_REASON, Some(elapsed))?;
                }
                Err(e) => {
                    error!(model = %model, "Model failed: {}", e);
                    row.fail(e.to_string(), Some(elapsed))?;
                }
            }
            self.notify_finished(progress, &row, elapsed);
            rows.push(row);
        }

        let summary = ComparisonSummary::new(input.date, rows);
        let summary_path = comparison_summary_path(&input.case_dir, input.date);
        self.ports
            .artifacts
            .write_text(&summary_path, &summary.render_markdown())
            .await?;
        progress.on_progress(&ProgressEvent::ArtifactWritten {
            path: summary_path.clone(),
        });

        Ok(RunAllModelsOutput {
            summary,
            summary_path,
            cancelled,
            elapsed: started.elapsed(),
        })
    }

    /// Decide which models run and under which backend name.
    ///
    /// Explicit names resolve against discovery (exactly or as
    /// `<name>:latest`); if discovery fails they are attempted as given.
    async fn plan(&self, requested: Option<Vec<Model>>) -> Result<Vec<Planned>, BatchError> {
        let discovered = self.ports.gateway.available_models().await;

        match (requested, discovered) {
            (None, Ok(listed)) if listed.is_empty() => Err(BatchError::NoModels),
            (None, Ok(listed)) => Ok(listed
                .into_iter()
                .map(|model| Planned {
                    requested: model.clone(),
                    resolved: Some(model),
                })
                .collect()),
            (None, Err(e)) => Err(BatchError::Discovery(e)),
            (Some(requested), Ok(listed)) => Ok(requested
                .into_iter()
                .map(|model| {
                    let resolved = listed
                        .iter()
                        .find(|l| *l == &model)
                        .or_else(|| listed.iter().find(|l| model.matches_listed(l.as_str())))
                        .cloned();
                    Planned {
                        requested: model,
                        resolved,
                    }
                })
                .collect()),
            (Some(requested), Err(e)) => {
                warn!("Model discovery failed, using models as given: {}", e);
                Ok(requested
                    .into_iter()
                    .map(|model| Planned {
                        requested: model.clone(),
                        resolved: Some(model),
                    })
                    .collect())
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
    }

    fn notify_finished(
        &self,
        progress: &dyn ProgressNotifier,
        row: &ComparisonRow,
        elapsed: Duration,
    ) {
        progress.on_progress(&ProgressEvent::ModelFinished {
            model: row.model.clone(),
            succeeded: row.failure_reason().is_none(),
            elapsed,
            reason: row.failure_reason().map(str::to_string),
        });
    }
}
