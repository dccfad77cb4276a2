//! Cached answers and the scope they live in

use crate::core::model::Model;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One cached answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub question: String,
    pub answer: String,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            cached_at: Utc::now(),
        }
    }
}

/// The (case directory, model) pair a cache belongs to.
///
/// `write_path` is where new entries are persisted for the current run;
/// stores may also consult older files belonging to the same pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    pub case_dir: PathBuf,
    pub model: Model,
    pub write_path: PathBuf,
}

impl CacheScope {
    pub fn new(case_dir: impl Into<PathBuf>, model: Model, write_path: impl Into<PathBuf>) -> Self {
        Self {
            case_dir: case_dir.into(),
            model,
            write_path: write_path.into(),
        }
    }
}

/// What a cache reset removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResetTarget {
    /// Every cache belonging to one model in a case directory
    Model { case_dir: PathBuf, model: Model },
    /// Every cache in a case directory
    All { case_dir: PathBuf },
}

impl CacheResetTarget {
    pub fn case_dir(&self) -> &std::path::Path {
        match self {
            Self::Model { case_dir, .. } | Self::All { case_dir } => case_dir,
        }
    }
}
