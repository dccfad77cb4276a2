//! Artifact store port
//!
//! Text files written by the pipeline. Writes replace the target atomically,
//! so a partially written artifact is never observable.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Could not write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Could not read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `contents` to `path`, creating parent directories
    async fn write_text(&self, path: &Path, contents: &str) -> Result<(), PersistenceError>;

    async fn read_text(&self, path: &Path) -> Result<String, PersistenceError>;

    async fn exists(&self, path: &Path) -> bool;

    /// Files matching a glob `pattern` relative to `dir`, sorted by path
    async fn find(&self, dir: &Path, pattern: &str) -> Vec<PathBuf>;
}
