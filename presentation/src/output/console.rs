//! Console output formatter for pipeline results

use colored::Colorize;
use std::path::Path;
use themis_application::{PipelineOutput, RunAllModelsOutput, RunCaseAnalysisOutput};
use themis_domain::util::format_elapsed;
use themis_domain::{Model, ModelRunState};

/// Number of backend models listed by the connectivity check
const MODEL_PREVIEW: usize = 5;

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Summary after `analyze`
    pub fn format_analysis(output: &RunCaseAnalysisOutput) -> String {
        let artifact = &output.artifact;
        let mut out = String::new();

        out.push_str(&Self::header("Case Analysis Complete"));
        out.push('\n');
        out.push_str(&Self::field("Model:", artifact.model.as_str()));
        out.push_str(&Self::field(
            "Documents:",
            &artifact.documents.len().to_string(),
        ));
        out.push_str(&Self::field(
            "Answers:",
            &format!(
                "{} ({} failed)",
                artifact.answer_count(),
                artifact.failed_count()
            ),
        ));

        let degraded = output.degraded_documents();
        if degraded > 0 {
            out.push_str(&format!(
                "\n{} {} document(s) could not be analyzed:\n",
                "!".yellow().bold(),
                degraded
            ));
            for doc in artifact.documents.iter().filter(|d| d.is_degraded()) {
                out.push_str(&format!("  * {}\n", doc.filename));
            }
        }

        out.push_str(&Self::section_header("Files"));
        out.push_str(&Self::path_line(&output.layout.analysis_json()));
        out.push_str(&Self::path_line(&output.layout.analysis_markdown()));

        out.push_str(&Self::elapsed_line(output.elapsed));
        out.push_str(&Self::footer());
        out
    }

    /// Summary after `defend` and `full-process`
    pub fn format_pipeline(output: &PipelineOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Defense Materials Ready"));
        out.push('\n');
        out.push_str(&Self::field("Model:", output.layout.model().as_str()));
        if let Some(source) = &output.analysis_source {
            out.push_str(&Self::field("Analysis:", &source.display().to_string()));
        }

        out.push_str(&Self::section_header("Defense Sections"));
        for section in output.defense.sections() {
            match &section.error {
                None => out.push_str(&format!("  {} {}\n", "v".green(), section.kind.title())),
                Some(reason) => out.push_str(&format!(
                    "  {} {}: {}\n",
                    "x".red(),
                    section.kind.title(),
                    reason
                )),
            }
        }

        out.push_str(&Self::section_header("Files"));
        for path in &output.paths.defense_files {
            out.push_str(&Self::path_line(path));
        }
        out.push_str(&format!(
            "\n{} {}\n",
            "Combined report:".cyan().bold(),
            output.paths.combined_report.display()
        ));

        out.push_str(&Self::elapsed_line(output.elapsed));
        out.push_str(&Self::footer());
        out
    }

    /// Results table after `all-models`
    pub fn format_comparison(output: &RunAllModelsOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("Model Comparison"));
        out.push('\n');

        for row in &output.summary.rows {
            let duration = row
                .duration
                .map(|d| format!(" ({})", format_elapsed(d)))
                .unwrap_or_default();
            match &row.state {
                ModelRunState::Succeeded => out.push_str(&format!(
                    "  {} {}{}\n",
                    "v".green(),
                    row.model.to_string().bold(),
                    duration
                )),
                ModelRunState::Failed { reason } => out.push_str(&format!(
                    "  {} {}{}: {}\n",
                    "x".red(),
                    row.model.to_string().bold(),
                    duration,
                    reason
                )),
                other => out.push_str(&format!("  - {} ({})\n", row.model, other.as_str())),
            }
        }

        let succeeded = output.summary.successful().count();
        out.push_str(&format!(
            "\n{} {}/{} model(s) succeeded\n",
            "Result:".cyan().bold(),
            succeeded,
            output.summary.rows.len()
        ));
        if output.cancelled {
            out.push_str(&format!("{}\n", "Batch was cancelled".yellow()));
        }
        out.push_str(&format!(
            "{} {}\n",
            "Summary:".cyan().bold(),
            output.summary_path.display()
        ));

        out.push_str(&Self::elapsed_line(output.elapsed));
        out.push_str(&Self::footer());
        out
    }

    /// Backend version and a preview of the models it serves
    pub fn format_connectivity(base_url: &str, version: &str, models: &[Model]) -> String {
        let mut out = format!(
            "{} Connected to Ollama {} at {}\n",
            "v".green(),
            version.bold(),
            base_url
        );
        if models.is_empty() {
            out.push_str(&format!("  {}\n", "No models installed".yellow()));
            return out;
        }

        let shown: Vec<&str> = models
            .iter()
            .take(MODEL_PREVIEW)
            .map(Model::as_str)
            .collect();
        out.push_str(&format!(
            "  {} {}",
            "Models:".dimmed(),
            shown.join(", ")
        ));
        if models.len() > MODEL_PREVIEW {
            out.push_str(&format!(" (+{} more)", models.len() - MODEL_PREVIEW));
        }
        out.push('\n');
        out
    }

    pub fn format_cache_cleared(removed: usize, case_dir: &Path, model: Option<&Model>) -> String {
        let scope = match model {
            Some(model) => format!("model {}", model),
            None => "all models".to_string(),
        };
        format!(
            "{} Removed {} cache file(s) for {} in {}",
            "v".green(),
            removed,
            scope,
            case_dir.display()
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    fn field(label: &str, value: &str) -> String {
        format!("{} {}\n", label.cyan().bold(), value)
    }

    fn path_line(path: &Path) -> String {
        format!("  {}\n", path.display())
    }

    fn elapsed_line(elapsed: std::time::Duration) -> String {
        format!("\n{} {}\n", "Elapsed:".dimmed(), format_elapsed(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::time::Duration;
    use themis_domain::{
        CaseAnalysisArtifact, ComparisonRow, ComparisonSummary, DocumentRecord, QaPair,
        QuestionSet, RunLayout, RunLinks,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_analysis_lists_degraded_documents() {
        let model = Model::new("m1");
        let output = RunCaseAnalysisOutput {
            artifact: CaseAnalysisArtifact::new(
                model.clone(),
                vec![
                    DocumentRecord::new("a.pdf", vec![QaPair::answered("Q?", "A.")]),
                    DocumentRecord::degraded("scan.pdf", &QuestionSet::fallback(), "no text"),
                ],
            ),
            layout: RunLayout::new("/cases/doe", &model, date()),
            elapsed: Duration::from_secs(61),
        };

        let text = ConsoleFormatter::format_analysis(&output);

        assert!(text.contains("scan.pdf"));
        assert!(text.contains("document_analysis_m1.json"));
        assert!(text.contains("1m 1s"));
    }

    #[test]
    fn test_comparison_shows_failure_reason() {
        let mut ok = ComparisonRow::pending(Model::new("a"));
        ok.start().unwrap();
        let layout = RunLayout::new("/cases/doe", &Model::new("a"), date());
        ok.succeed(Duration::from_secs(5), RunLinks::for_layout(&layout))
            .unwrap();
        let mut bad = ComparisonRow::pending(Model::new("b"));
        bad.fail("model 'b' is not available on the backend", None)
            .unwrap();

        let output = RunAllModelsOutput {
            summary: ComparisonSummary::new(date(), vec![ok, bad]),
            summary_path: PathBuf::from("/cases/doe/model_comparison_20240315.md"),
            cancelled: false,
            elapsed: Duration::from_secs(5),
        };

        let text = ConsoleFormatter::format_comparison(&output);

        assert!(text.contains("1/2"));
        assert!(text.contains("not available on the backend"));
        assert!(text.contains("model_comparison_20240315.md"));
    }

    #[test]
    fn test_connectivity_previews_five_models() {
        let models: Vec<Model> = (1..=7).map(|i| Model::new(format!("m{}", i))).collect();

        let text = ConsoleFormatter::format_connectivity("http://localhost:11434", "0.3.12", &models);

        assert!(text.contains("m5"));
        assert!(!text.contains("m6"));
        assert!(text.contains("+2 more"));
    }
}
