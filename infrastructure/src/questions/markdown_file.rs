//! Numbered questions in a markdown file
//!
//! ```markdown
//! # Questions
//!
//! 1. What are the main claims or charges?
//! 2) What is the key evidence?
//! ```
//!
//! Only numbered lines count; headings, prose and bullets are ignored.

use regex::Regex;
use std::path::Path;
use themis_application::ports::question_source::{QuestionLoadError, QuestionSource};
use themis_domain::QuestionSet;
use tracing::debug;

const NUMBERED_LINE: &str = r"^\s*\d+[.)]\s*(.*)$";

/// Reads the questions file from disk on every [`QuestionSource::load`]
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownQuestionFile;

impl MarkdownQuestionFile {
    pub fn new() -> Self {
        Self
    }

    /// Extract the numbered questions from markdown text
    pub fn parse(text: &str) -> Option<QuestionSet> {
        let pattern = Regex::new(NUMBERED_LINE).ok()?;
        QuestionSet::from_texts(
            text.lines()
                .filter_map(|line| pattern.captures(line))
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string())),
        )
    }
}

impl QuestionSource for MarkdownQuestionFile {
    fn load(&self, path: &Path) -> Result<QuestionSet, QuestionLoadError> {
        if !path.exists() {
            return Err(QuestionLoadError::NotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|e| QuestionLoadError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let questions =
            Self::parse(&text).ok_or_else(|| QuestionLoadError::NoQuestions(path.to_path_buf()))?;
        debug!("Loaded {} questions from {}", questions.len(), path.display());
        Ok(questions)
    }
}
