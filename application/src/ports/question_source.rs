//! Question source port
//!
//! Loads the question set from a file. The runner calls this before every
//! document, so edits to the file apply from the next document on.

use std::path::{Path, PathBuf};
use themis_domain::QuestionSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestionLoadError {
    #[error("Questions file not found: {0}")]
    NotFound(PathBuf),

    #[error("Could not read questions file {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("No numbered questions in {0}")]
    NoQuestions(PathBuf),
}

pub trait QuestionSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<QuestionSet, QuestionLoadError>;
}
