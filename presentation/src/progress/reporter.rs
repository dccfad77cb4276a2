//! Progress reporting for pipeline runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use themis_application::ports::progress::{ProgressEvent, ProgressNotifier};
use themis_domain::util::format_elapsed;

/// Reports progress with a bar per document and a spinner per defense section
pub struct ProgressReporter {
    multi: MultiProgress,
    document_bar: Mutex<Option<ProgressBar>>,
    section_spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            document_bar: Mutex::new(None),
            section_spinner: Mutex::new(None),
        }
    }

    fn document_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn println(&self, line: String) {
        // Printing above the bars keeps them intact; fall back to stdout
        if self.multi.println(&line).is_err() {
            println!("{}", line);
        }
    }

    fn with_document_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.document_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }

    fn take_document_bar(&self) -> Option<ProgressBar> {
        self.document_bar.lock().ok().and_then(|mut guard| guard.take())
    }

    fn take_section_spinner(&self) -> Option<ProgressBar> {
        self.section_spinner.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DocumentStarted {
                index,
                total,
                file_name,
            } => {
                let pb = self.multi.add(ProgressBar::new(0));
                pb.set_style(Self::document_style());
                pb.set_prefix(format!("[{}/{}] {}", index, total, file_name));
                pb.set_message("Loading questions...");
                if let Ok(mut guard) = self.document_bar.lock() {
                    *guard = Some(pb);
                }
            }
            ProgressEvent::QuestionsLoaded { count, .. } => {
                self.with_document_bar(|pb| {
                    pb.set_length(*count as u64);
                    pb.set_message("Starting...");
                });
            }
            ProgressEvent::TextExtracted { chars, .. } => {
                self.with_document_bar(|pb| {
                    pb.set_message(format!("{} chars extracted", chars));
                });
            }
            ProgressEvent::QuestionAnswered {
                from_cache,
                preview,
                ..
            } => {
                self.with_document_bar(|pb| {
                    let marker = if *from_cache {
                        "cached".dimmed().to_string()
                    } else {
                        "v".green().to_string()
                    };
                    pb.set_message(format!("{} {}", marker, preview));
                    pb.inc(1);
                });
            }
            ProgressEvent::QuestionFailed {
                position, reason, ..
            } => {
                self.with_document_bar(|pb| {
                    pb.set_message(format!("{} Q{}: {}", "x".red(), position, reason));
                    pb.inc(1);
                });
            }
            ProgressEvent::RetryScheduled { .. } => {
                let line = SimpleProgress::describe(event);
                self.with_document_bar(|pb| pb.set_message(line.trim().to_string()));
                if let Ok(guard) = self.section_spinner.lock()
                    && let Some(spinner) = guard.as_ref()
                {
                    spinner.set_message(line.trim().to_string());
                }
            }
            ProgressEvent::DocumentCompleted {
                answered, failed, ..
            } => {
                if let Some(pb) = self.take_document_bar() {
                    let status = if *failed == 0 {
                        format!("{} {} answered", "v".green(), answered)
                    } else {
                        format!("{} {} answered, {} failed", "!".yellow(), answered, failed)
                    };
                    pb.finish_with_message(status);
                }
            }
            ProgressEvent::DocumentFailed { reason, .. } => {
                if let Some(pb) = self.take_document_bar() {
                    pb.abandon_with_message(format!("{} {}", "x".red(), reason));
                }
            }
            ProgressEvent::DefenseSectionStarted { kind } => {
                let spinner = self.multi.add(ProgressBar::new_spinner());
                spinner.set_style(Self::spinner_style());
                spinner.set_prefix(kind.title().to_string());
                spinner.set_message("Generating...");
                spinner.enable_steady_tick(Duration::from_millis(120));
                if let Ok(mut guard) = self.section_spinner.lock() {
                    *guard = Some(spinner);
                }
            }
            ProgressEvent::DefenseSectionCompleted { elapsed, .. } => {
                if let Some(spinner) = self.take_section_spinner() {
                    spinner.finish_with_message(format!(
                        "{} done in {}",
                        "v".green(),
                        format_elapsed(*elapsed)
                    ));
                }
            }
            ProgressEvent::DefenseSectionFailed { reason, .. } => {
                if let Some(spinner) = self.take_section_spinner() {
                    spinner.abandon_with_message(format!("{} {}", "x".red(), reason));
                }
            }
            other => self.println(SimpleProgress::describe(other)),
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl SimpleProgress {
    /// One status line for an event
    pub fn describe(event: &ProgressEvent) -> String {
        match event {
            ProgressEvent::QuestionsLoaded { count, builtin } => {
                let source = if *builtin { "built-in" } else { "questions file" };
                format!("  {} {} questions ({})", "->".cyan(), count, source)
            }
            ProgressEvent::QuestionsFallback { reason } => format!(
                "  {} {}; using built-in questions",
                "!".yellow(),
                reason
            ),
            ProgressEvent::CaseStarted {
                model,
                case_dir,
                documents,
            } => format!(
                "{} {} {} PDF(s) in {} with {}",
                "->".cyan(),
                "Analyzing".bold(),
                documents,
                case_dir.display(),
                model.to_string().bold()
            ),
            ProgressEvent::DocumentStarted {
                index,
                total,
                file_name,
            } => format!("{} [{}/{}] {}", "->".cyan(), index, total, file_name.bold()),
            ProgressEvent::TextExtracted { file_name, chars } => {
                format!("  {} {} chars from {}", "->".cyan(), chars, file_name)
            }
            ProgressEvent::QuestionAnswered {
                position,
                total,
                from_cache,
                preview,
                elapsed,
            } => {
                let origin = if *from_cache {
                    "cached".dimmed().to_string()
                } else {
                    format!("{:.1}s", elapsed.as_secs_f64())
                };
                format!(
                    "  {} Q{}/{} ({}) {}",
                    "v".green(),
                    position,
                    total,
                    origin,
                    preview
                )
            }
            ProgressEvent::QuestionFailed {
                position,
                total,
                reason,
            } => format!("  {} Q{}/{} {}", "x".red(), position, total, reason),
            ProgressEvent::RetryScheduled {
                attempt,
                max_attempts,
                delay,
                reason,
            } => format!(
                "  {} attempt {}/{} failed ({}), retrying in {:.1}s",
                "!".yellow(),
                attempt,
                max_attempts,
                reason,
                delay.as_secs_f64()
            ),
            ProgressEvent::DocumentCompleted {
                file_name,
                answered,
                failed,
            } => {
                if *failed == 0 {
                    format!("  {} {}: {} answered", "v".green(), file_name, answered)
                } else {
                    format!(
                        "  {} {}: {} answered, {} failed",
                        "!".yellow(),
                        file_name,
                        answered,
                        failed
                    )
                }
            }
            ProgressEvent::DocumentFailed { file_name, reason } => {
                format!("  {} {}: {}", "x".red(), file_name, reason)
            }
            ProgressEvent::DefenseSectionStarted { kind } => {
                format!("{} {}", "->".cyan(), kind.title().bold())
            }
            ProgressEvent::DefenseSectionCompleted { kind, elapsed } => format!(
                "  {} {} ({})",
                "v".green(),
                kind.title(),
                format_elapsed(*elapsed)
            ),
            ProgressEvent::DefenseSectionFailed { kind, reason } => {
                format!("  {} {}: {}", "x".red(), kind.title(), reason)
            }
            ProgressEvent::ArtifactWritten { path } => {
                format!("  {} {}", "wrote".dimmed(), path.display())
            }
            ProgressEvent::ModelStarted {
                index,
                total,
                model,
            } => format!(
                "\n{} Model {}/{}: {}",
                "==>".cyan().bold(),
                index,
                total,
                model.to_string().bold()
            ),
            ProgressEvent::ModelFinished {
                model,
                succeeded,
                elapsed,
                reason,
            } => {
                if *succeeded {
                    format!(
                        "{} {} finished in {}",
                        "v".green(),
                        model,
                        format_elapsed(*elapsed)
                    )
                } else {
                    format!(
                        "{} {} failed: {}",
                        "x".red(),
                        model,
                        reason.as_deref().unwrap_or("unknown error")
                    )
                }
            }
        }
    }
}

impl ProgressNotifier for SimpleProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        println!("{}", Self::describe(event));
    }
}
