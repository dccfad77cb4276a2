//! Assemble Report use case
//!
//! Materializes the run directory: analysis files, the three defense
//! documents and the combined report at the case root.

use crate::ports::artifact_store::{ArtifactStore, PersistenceError};
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use std::path::PathBuf;
use std::sync::Arc;
use themis_domain::{
    CaseAnalysisArtifact, DefenseArtifact, RunLayout, render_analysis_markdown,
    render_combined_report,
};
use tracing::debug;

/// Paths written by one assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub analysis_json: PathBuf,
    pub analysis_markdown: PathBuf,
    pub defense_files: Vec<PathBuf>,
    pub combined_report: PathBuf,
}

pub struct AssembleReportUseCase {
    artifacts: Arc<dyn ArtifactStore>,
}

impl AssembleReportUseCase {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }

    /// Write every file of the run described by `layout`.
    ///
    /// Analysis files already present in the run directory are kept as they
    /// are; they are only written when the analysis came from elsewhere.
    pub async fn assemble(
        &self,
        artifact: &CaseAnalysisArtifact,
        defense: &DefenseArtifact,
        layout: &RunLayout,
        progress: &dyn ProgressNotifier,
    ) -> Result<ReportPaths, PersistenceError> {
        let analysis_json = layout.analysis_json();
        if !self.artifacts.exists(&analysis_json).await {
            let json = artifact
                .to_json()
                .map_err(|e| PersistenceError::Write {
                    path: analysis_json.clone(),
                    message: e.to_string(),
                })?;
            self.write(&analysis_json, &json, progress).await?;
        }

        let analysis_markdown = layout.analysis_markdown();
        if !self.artifacts.exists(&analysis_markdown).await {
            self.write(
                &analysis_markdown,
                &render_analysis_markdown(artifact),
                progress,
            )
            .await?;
        }

        let mut defense_files = Vec::with_capacity(3);
        for section in defense.sections() {
            let path = layout.defense_file(section.kind);
            self.write(&path, &section.to_markdown(), progress).await?;
            defense_files.push(path);
        }

        let combined_report = layout.combined_report();
        self.write(
            &combined_report,
            &render_combined_report(artifact, defense, layout),
            progress,
        )
        .await?;

        Ok(ReportPaths {
            analysis_json,
            analysis_markdown,
            defense_files,
            combined_report,
        })
    }

    async fn write(
        &self,
        path: &std::path::Path,
        contents: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), PersistenceError> {
        self.artifacts.write_text(path, contents).await?;
        debug!("Wrote {}", path.display());
        progress.on_progress(&ProgressEvent::ArtifactWritten {
            path: path.to_path_buf(),
        });
        Ok(())
    }
}
