//! Domain layer for themis
//!
//! This crate contains the records, fingerprints and renderers of the case
//! analysis pipeline. It performs no I/O: paths are computed, never touched.
//!
//! # Core Concepts
//!
//! ## Analysis
//!
//! Every PDF of a case directory is asked the same ordered [`QuestionSet`].
//! Answers are collected into [`DocumentRecord`]s, and a case run yields one
//! [`CaseAnalysisArtifact`] per model.
//!
//! ## Caching
//!
//! Each answer is cached under a [`CacheKey`] derived from the document's
//! name and content, the question's position and text, and the model.
//!
//! ## Defense and reports
//!
//! A [`DefenseArtifact`] (strategy, action items, timeline) is synthesized
//! from the analysis; [`RunLayout`] decides where everything is written.

pub mod analysis;
pub mod cache;
pub mod core;
pub mod defense;
pub mod prompt;
pub mod report;
pub mod util;

// Re-export commonly used types
pub use analysis::{CaseAnalysisArtifact, DocumentRecord, QaPair, render_analysis_markdown};
pub use cache::{CacheEntry, CacheKey, CacheResetTarget, CacheScope, DocumentIdentity};
pub use crate::core::{
    error::DomainError,
    model::{DEFAULT_MODEL, Model, sanitize_model_name},
    question::{FALLBACK_QUESTIONS, Question, QuestionSet},
};
pub use defense::{DefenseArtifact, DefenseKind, DefenseSection};
pub use prompt::PromptTemplate;
pub use report::{
    ComparisonRow, ComparisonSummary, ModelRunState, RunLayout, RunLinks, comparison_summary_path,
    render_combined_report,
};
