//! Progress notification port
//!
//! Defines the observer interface the pipeline reports to. Calls are
//! synchronous and nothing in the pipeline depends on what the observer does.

use std::path::PathBuf;
use std::time::Duration;
use themis_domain::{DefenseKind, Model};

/// Something worth telling the user about
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A question set was loaded before a document
    QuestionsLoaded { count: usize, builtin: bool },
    /// The questions file could not be used; the built-in set applies
    QuestionsFallback { reason: String },
    CaseStarted {
        model: Model,
        case_dir: PathBuf,
        documents: usize,
    },
    DocumentStarted {
        index: usize,
        total: usize,
        file_name: String,
    },
    TextExtracted { file_name: String, chars: usize },
    QuestionAnswered {
        position: usize,
        total: usize,
        from_cache: bool,
        preview: String,
        elapsed: Duration,
    },
    QuestionFailed {
        position: usize,
        total: usize,
        reason: String,
    },
    RetryScheduled {
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        reason: String,
    },
    DocumentCompleted {
        file_name: String,
        answered: usize,
        failed: usize,
    },
    DocumentFailed { file_name: String, reason: String },
    DefenseSectionStarted { kind: DefenseKind },
    DefenseSectionCompleted { kind: DefenseKind, elapsed: Duration },
    DefenseSectionFailed { kind: DefenseKind, reason: String },
    ArtifactWritten { path: PathBuf },
    ModelStarted {
        index: usize,
        total: usize,
        model: Model,
    },
    ModelFinished {
        model: Model,
        succeeded: bool,
        elapsed: Duration,
        reason: Option<String>,
    },
}

/// Callback for progress updates during a pipeline run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain lines, nothing).
pub trait ProgressNotifier: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
