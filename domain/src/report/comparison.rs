//! Cross-model comparison summary for batch runs.

use super::layout::RunLayout;
use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::defense::DefenseKind;
use crate::util::format_elapsed;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write;
use std::time::Duration;

/// Lifecycle of one model inside a batch run
///
/// `Pending -> Running -> {Succeeded, Failed}`; a model that never starts
/// (unresolved name, cancelled batch) goes straight from `Pending` to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRunState {
    Pending,
    Running,
    Succeeded,
    Failed { reason: String },
}

impl ModelRunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    fn can_transition_to(&self, next: &ModelRunState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed { .. })
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed { .. })
        )
    }
}

/// Links to a model's artifacts, relative to the case directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLinks {
    pub analysis: String,
    pub strategy: String,
    pub report: String,
}

impl RunLinks {
    pub fn for_layout(layout: &RunLayout) -> Self {
        Self {
            analysis: layout.relative_analysis_markdown(),
            strategy: layout.relative_defense_file(DefenseKind::Strategy),
            report: layout.relative_combined_report(),
        }
    }
}

/// One row of the comparison summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub model: Model,
    pub state: ModelRunState,
    pub duration: Option<Duration>,
    pub links: Option<RunLinks>,
}

impl ComparisonRow {
    pub fn pending(model: Model) -> Self {
        Self {
            model,
            state: ModelRunState::Pending,
            duration: None,
            links: None,
        }
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transition(ModelRunState::Running)
    }

    pub fn succeed(&mut self, duration: Duration, links: RunLinks) -> Result<(), DomainError> {
        self.transition(ModelRunState::Succeeded)?;
        self.duration = Some(duration);
        self.links = Some(links);
        Ok(())
    }

    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        duration: Option<Duration>,
    ) -> Result<(), DomainError> {
        self.transition(ModelRunState::Failed {
            reason: reason.into(),
        })?;
        self.duration = duration;
        Ok(())
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            ModelRunState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    fn transition(&mut self, next: ModelRunState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(&next) {
            return Err(DomainError::InvalidTransition {
                model: self.model.to_string(),
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Ordered rows, one per model, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonSummary {
    pub fn new(date: NaiveDate, rows: Vec<ComparisonRow>) -> Self {
        Self {
            date,
            generated_at: Utc::now(),
            rows,
        }
    }

    pub fn successful(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows
            .iter()
            .filter(|r| r.state == ModelRunState::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|r| r.failure_reason().is_some())
    }

    /// Render `model_comparison_<YYYYMMDD>.md`.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# Themis Model Comparison\n");
        let _ = writeln!(
            out,
            "Generated on {}\n",
            self.generated_at.format("%Y-%m-%d at %H:%M UTC")
        );

        let _ = writeln!(out, "## Models Compared\n");
        let _ = writeln!(out, "### Successful Models\n");
        let successful: Vec<_> = self.successful().collect();
        if successful.is_empty() {
            let _ = writeln!(out, "_None_");
        }
        for (i, row) in successful.iter().enumerate() {
            let _ = writeln!(out, "{}. {}{}", i + 1, row.model, duration_suffix(row));
        }

        let failed: Vec<_> = self.failed().collect();
        if !failed.is_empty() {
            let _ = writeln!(out, "\n### Failed Models\n");
            for (i, row) in failed.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {}: {}",
                    i + 1,
                    row.model,
                    single_line(row.failure_reason().unwrap_or_default())
                );
            }
        }

        let _ = writeln!(out, "\n## Results\n");
        let _ = writeln!(
            out,
            "| Model | Status | Duration | Analysis | Defense Strategy | Combined Report |"
        );
        let _ = writeln!(
            out,
            "|-------|--------|----------|----------|------------------|-----------------|"
        );
        for row in &self.rows {
            let status = match &row.state {
                ModelRunState::Succeeded => "✅ succeeded".to_string(),
                ModelRunState::Failed { .. } => "❌ failed".to_string(),
                other => other.as_str().to_string(),
            };
            let duration = row
                .duration
                .map(format_elapsed)
                .unwrap_or_else(|| "-".to_string());
            let (analysis, strategy, report) = match &row.links {
                Some(links) => (
                    format!("[Analysis]({})", links.analysis),
                    format!("[Strategy]({})", links.strategy),
                    format!("[Report]({})", links.report),
                ),
                None => ("❌".to_string(), "❌".to_string(), "❌".to_string()),
            };
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                table_cell(row.model.as_str()),
                status,
                duration,
                analysis,
                strategy,
                report
            );
        }

        out
    }
}

fn duration_suffix(row: &ComparisonRow) -> String {
    row.duration
        .map(|d| format!(" ({})", format_elapsed(d)))
        .unwrap_or_default()
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn table_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}
