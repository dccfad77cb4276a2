//! Run Case Analysis use case
//!
//! Walks every PDF of a case directory with the document analyzer and
//! persists the resulting [`CaseAnalysisArtifact`].

use crate::config::PipelineParams;
use crate::ports::PipelinePorts;
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use crate::use_cases::analyze_document::{AnalysisError, AnalyzeDocumentUseCase};
use crate::use_cases::shared::check_cancelled;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use themis_domain::{
    CaseAnalysisArtifact, DocumentRecord, Model, QuestionSet, RunLayout, render_analysis_markdown,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Input for the RunCaseAnalysis use case
#[derive(Debug, Clone)]
pub struct RunCaseAnalysisInput {
    pub case_dir: PathBuf,
    pub model: Model,
    /// Reloaded before every document; `None` uses the built-in questions
    pub questions_path: Option<PathBuf>,
    /// Run date used for the output layout
    pub date: NaiveDate,
}

impl RunCaseAnalysisInput {
    pub fn new(case_dir: impl Into<PathBuf>, model: Model, date: NaiveDate) -> Self {
        Self {
            case_dir: case_dir.into(),
            model,
            questions_path: None,
            date,
        }
    }

    pub fn with_questions(mut self, path: impl Into<PathBuf>) -> Self {
        self.questions_path = Some(path.into());
        self
    }

    pub fn layout(&self) -> RunLayout {
        RunLayout::new(&self.case_dir, &self.model, self.date)
    }
}

/// Output of a case analysis run
#[derive(Debug, Clone)]
pub struct RunCaseAnalysisOutput {
    pub artifact: CaseAnalysisArtifact,
    pub layout: RunLayout,
    pub elapsed: Duration,
}

impl RunCaseAnalysisOutput {
    pub fn degraded_documents(&self) -> usize {
        self.artifact
            .documents
            .iter()
            .filter(|d| d.is_degraded())
            .count()
    }
}

/// Use case for analyzing every document of a case
pub struct RunCaseAnalysisUseCase {
    ports: PipelinePorts,
    params: PipelineParams,
    cancellation_token: Option<CancellationToken>,
}

impl RunCaseAnalysisUseCase {
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
        input: RunCaseAnalysisInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<RunCaseAnalysisOutput, AnalysisError> {
        let started = Instant::now();
        let layout = input.layout();

        let documents = self.ports.documents.list_documents(&input.case_dir).await?;
        if documents.is_empty() {
            return Err(AnalysisError::NoDocumentsFound(input.case_dir));
        }

        info!(
            model = %input.model,
            case_dir = %input.case_dir.display(),
            documents = documents.len(),
            "Starting case analysis"
        );
        progress.on_progress(&ProgressEvent::CaseStarted {
            model: input.model.clone(),
            case_dir: input.case_dir.clone(),
            documents: documents.len(),
        });

        let analyzer = AnalyzeDocumentUseCase::new(
            self.ports.gateway.clone(),
            self.ports.documents.clone(),
            self.ports.cache.clone(),
            self.ports.call_logs.open(&layout),
            self.params.clone(),
            self.cancellation_token.clone(),
        );
        let cache_scope = layout.cache_scope();

        let total = documents.len();
        let mut records = Vec::with_capacity(total);
        for (index, document) in documents.iter().enumerate() {
            check_cancelled(&self.cancellation_token)?;

            // Edits to the questions file apply from the next document on
            let questions = self.load_questions(input.questions_path.as_deref(), progress);

            progress.on_progress(&ProgressEvent::DocumentStarted {
                index: index + 1,
                total,
                file_name: document.file_name.clone(),
            });

            let record = match analyzer
                .analyze(document, &questions, &input.model, &cache_scope, progress)
                .await
            {
                Ok(record) => {
                    progress.on_progress(&ProgressEvent::DocumentCompleted {
                        file_name: record.filename.clone(),
                        answered: record.answers.len() - record.failed_count(),
                        failed: record.failed_count(),
                    });
                    record
                }
                Err(e) if e.is_document_local() => {
                    warn!(document = %document.file_name, "Document degraded: {}", e);
                    progress.on_progress(&ProgressEvent::DocumentFailed {
                        file_name: document.file_name.clone(),
                        reason: e.to_string(),
                    });
                    DocumentRecord::degraded(&document.file_name, &questions, &e.to_string())
                }
                Err(e) => return Err(e),
            };
            records.push(record);
        }

        let artifact = CaseAnalysisArtifact::new(input.model.clone(), records);
        self.persist(&artifact, &layout, progress).await?;

        let elapsed = started.elapsed();
        info!(
            model = %input.model,
            answers = artifact.answer_count(),
            failed = artifact.failed_count(),
            "Case analysis finished in {:?}",
            elapsed
        );

        Ok(RunCaseAnalysisOutput {
            artifact,
            layout,
            elapsed,
        })
    }

    fn load_questions(
        &self,
        path: Option<&std::path::Path>,
        progress: &dyn ProgressNotifier,
    ) -> QuestionSet {
        let questions = match path {
            None => QuestionSet::fallback(),
            Some(path) => match self.ports.questions.load(path) {
                Ok(questions) => questions,
                Err(e) => {
                    warn!("Using built-in questions: {}", e);
                    progress.on_progress(&ProgressEvent::QuestionsFallback {
                        reason: e.to_string(),
                    });
                    QuestionSet::fallback()
                }
            },
        };

        progress.on_progress(&ProgressEvent::QuestionsLoaded {
            count: questions.len(),
            builtin: questions.is_builtin(),
        });
        questions
    }

    async fn persist(
        &self,
        artifact: &CaseAnalysisArtifact,
        layout: &RunLayout,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), AnalysisError> {
        let json = artifact.to_json()?;
        let json_path = layout.analysis_json();
        self.ports.artifacts.write_text(&json_path, &json).await?;
        progress.on_progress(&ProgressEvent::ArtifactWritten { path: json_path });

        let markdown_path = layout.analysis_markdown();
        self.ports
            .artifacts
            .write_text(&markdown_path, &render_analysis_markdown(artifact))
            .await?;
        progress.on_progress(&ProgressEvent::ArtifactWritten {
            path: markdown_path,
        });
        Ok(())
    }
}
