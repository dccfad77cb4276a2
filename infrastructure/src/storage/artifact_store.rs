//! Local file system implementation of the ArtifactStore port

use super::atomic::write_atomic;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use themis_application::ports::artifact_store::{ArtifactStore, PersistenceError};
use tracing::warn;

/// Stores run artifacts as plain files
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalArtifactStore;

impl LocalArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn write_text(&self, path: &Path, contents: &str) -> Result<(), PersistenceError> {
        let target = path.to_path_buf();
        let bytes = contents.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
            .await
            .map_err(|e| PersistenceError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .map_err(|e| PersistenceError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    async fn read_text(&self, path: &Path) -> Result<String, PersistenceError> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PersistenceError::NotFound(path.to_path_buf())
            } else {
                PersistenceError::Read {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn find(&self, dir: &Path, pattern: &str) -> Vec<PathBuf> {
        glob_sorted(dir, pattern)
    }
}

/// Glob `pattern` below `dir`, sorted by path. `dir` is matched literally.
pub(crate) fn glob_sorted(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );

    let mut matches: Vec<PathBuf> = match glob::glob(&full) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            warn!("Invalid glob pattern {}: {}", full, e);
            Vec::new()
        }
    };
    matches.sort();
    matches
}
