//! Run Pipeline use case
//!
//! Chains analysis, defense synthesis and report assembly for one model.
//! `defend` runs the last two stages against a previously saved analysis.

use crate::config::PipelineParams;
use crate::ports::PipelinePorts;
use crate::ports::artifact_store::PersistenceError;
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::analyze_document::AnalysisError;
use crate::use_cases::assemble_report::{AssembleReportUseCase, ReportPaths};
use crate::use_cases::run_case_analysis::{RunCaseAnalysisInput, RunCaseAnalysisUseCase};
use crate::use_cases::synthesize_defense::{DefenseError, SynthesizeDefenseUseCase};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use themis_domain::{CaseAnalysisArtifact, DefenseArtifact, Model, RunLayout};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that can occur while running the pipeline for one model
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Defense synthesis failed: {0}")]
    Defense(#[from] DefenseError),

    #[error("Could not write report: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("No analysis file found (looked in: {})", display_paths(.searched))]
    AnalysisNotFound { searched: Vec<PathBuf> },

    #[error("Invalid analysis file {}: {message}", .path.display())]
    InvalidArtifact { path: PathBuf, message: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Analysis(e) => e.is_cancelled(),
            Self::Defense(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Input for `full_process`
#[derive(Debug, Clone)]
pub struct FullProcessInput {
    pub case_dir: PathBuf,
    pub model: Model,
    pub questions_path: Option<PathBuf>,
    pub date: NaiveDate,
}

impl FullProcessInput {
    pub fn new(case_dir: impl Into<PathBuf>, model: Model, date: NaiveDate) -> Self {
        Self {
            case_dir: case_dir.into(),
            model,
            questions_path: None,
            date,
        }
    }

    pub fn with_questions(mut self, path: Option<PathBuf>) -> Self {
        self.questions_path = path;
        self
    }
}

/// Input for `defend`
#[derive(Debug, Clone)]
pub struct DefendInput {
    pub case_dir: PathBuf,
    pub model: Model,
    /// Explicit analysis JSON; otherwise the run directories are searched
    pub analysis_file: Option<PathBuf>,
    pub date: NaiveDate,
}

impl DefendInput {
    pub fn new(case_dir: impl Into<PathBuf>, model: Model, date: NaiveDate) -> Self {
        Self {
            case_dir: case_dir.into(),
            model,
            analysis_file: None,
            date,
        }
    }

    pub fn with_analysis_file(mut self, path: Option<PathBuf>) -> Self {
        self.analysis_file = path;
        self
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub artifact: CaseAnalysisArtifact,
    pub defense: DefenseArtifact,
    pub layout: RunLayout,
    pub paths: ReportPaths,
    /// Where the analysis came from when `defend` loaded it
    pub analysis_source: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Use case for the analysis → defense → report sequence
pub struct RunPipelineUseCase {
    ports: PipelinePorts,
    params: PipelineParams,
    cancellation_token: Option<CancellationToken>,
}

impl RunPipelineUseCase {
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

    pub async fn full_process(
        &self,
        input: FullProcessInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();

        let mut runner = RunCaseAnalysisUseCase::new(self.ports.clone(), self.params.clone());
        if let Some(token) = &self.cancellation_token {
            runner = runner.with_cancellation(token.clone());
        }
        let mut analysis_input =
            RunCaseAnalysisInput::new(&input.case_dir, input.model.clone(), input.date);
        analysis_input.questions_path = input.questions_path;
        let analysis = runner.execute(analysis_input, progress).await?;

        let (defense, paths) = self
            .defend_and_assemble(&analysis.artifact, &input.model, &analysis.layout, progress)
            .await?;

        Ok(PipelineOutput {
            artifact: analysis.artifact,
            defense,
            layout: analysis.layout,
            paths,
            analysis_source: None,
            elapsed: started.elapsed(),
        })
    }

    pub async fn defend(
        &self,
        input: DefendInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();
        let layout = RunLayout::new(&input.case_dir, &input.model, input.date);

        let source = self
            .resolve_analysis(input.analysis_file.as_deref(), &layout)
            .await?;
        let json = self.ports.artifacts.read_text(&source).await?;
        let artifact =
            CaseAnalysisArtifact::from_json(&json).map_err(|e| PipelineError::InvalidArtifact {
                path: source.clone(),
                message: e.to_string(),
            })?;
        info!(
            source = %source.display(),
            documents = artifact.documents.len(),
            "Loaded analysis"
        );
        if artifact.model != input.model {
            warn!(
                "Analysis was produced by {}, synthesizing defense with {}",
                artifact.model, input.model
            );
        }

        let (defense, paths) = self
            .defend_and_assemble(&artifact, &input.model, &layout, progress)
            .await?;

        Ok(PipelineOutput {
            artifact,
            defense,
            layout,
            paths,
            analysis_source: Some(source),
            elapsed: started.elapsed(),
        })
    }

    async fn defend_and_assemble(
        &self,
        artifact: &CaseAnalysisArtifact,
        model: &Model,
        layout: &RunLayout,
        progress: &dyn ProgressNotifier,
    ) -> Result<(DefenseArtifact, ReportPaths), PipelineError> {
        let synthesizer = SynthesizeDefenseUseCase::new(
            self.ports.gateway.clone(),
            self.ports.call_logs.open(layout),
            self.params.clone(),
            self.cancellation_token.clone(),
        );
        let defense = synthesizer.synthesize(artifact, model, progress).await?;

        let assembler = AssembleReportUseCase::new(self.ports.artifacts.clone());
        let paths = assembler.assemble(artifact, &defense, layout, progress).await?;
        Ok((defense, paths))
    }

    /// Explicit file, then today's run directory, then the newest earlier
    /// run for the same model, then the case root.
    async fn resolve_analysis(
        &self,
        explicit: Option<&std::path::Path>,
        layout: &RunLayout,
    ) -> Result<PathBuf, PipelineError> {
        if let Some(path) = explicit {
            return if self.ports.artifacts.exists(path).await {
                Ok(path.to_path_buf())
            } else {
                Err(PipelineError::AnalysisNotFound {
                    searched: vec![path.to_path_buf()],
                })
            };
        }

        let mut candidates = vec![layout.analysis_json()];
        let pattern = format!("*_{}/{}", layout.token(), layout.analysis_json_name());
        let mut earlier = self.ports.artifacts.find(layout.case_dir(), &pattern).await;
        // Run directories start with the date, so the last one is the newest
        earlier.reverse();
        candidates.extend(earlier);
        candidates.push(layout.case_root_analysis_json());

        for candidate in &candidates {
            if self.ports.artifacts.exists(candidate).await {
                return Ok(candidate.clone());
            }
        }
        Err(PipelineError::AnalysisNotFound {
            searched: vec![
                layout.analysis_json(),
                layout.case_dir().join(pattern),
                layout.case_root_analysis_json(),
            ],
        })
    }
}
