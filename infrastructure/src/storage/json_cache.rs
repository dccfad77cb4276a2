//! JSON file implementation of the CacheStore port
//!
//! Each run directory holds an `analysis_cache.json` mapping cache keys to
//! entries. The first access to a (case directory, model) scope merges every
//! cache file that model left in the case directory, oldest run first, so
//! answers survive a change of date. Every store rewrites the current run's
//! file atomically with the whole merged view.

use super::artifact_store::glob_sorted;
use super::atomic::write_atomic;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use themis_application::ports::cache_store::{CacheError, CacheStore};
use themis_domain::report::layout::{CACHE_FILE_NAME, parse_run_dir_name};
use themis_domain::{CacheEntry, CacheKey, CacheResetTarget, CacheScope};
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Entries = BTreeMap<CacheKey, CacheEntry>;

/// Answer cache persisted as JSON next to the run artifacts
#[derive(Default)]
pub struct JsonCacheStore {
    /// Loaded scopes, keyed by their write path
    scopes: Mutex<HashMap<PathBuf, Entries>>,
}

impl JsonCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache files of every `<YYYYMMDD>_<token>` run directory, oldest first.
    ///
    /// A token that merely ends in `_<token>` belongs to another model.
    fn model_files(case_dir: &Path, token: &str) -> Vec<PathBuf> {
        glob_sorted(case_dir, &format!("*/{}", CACHE_FILE_NAME))
            .into_iter()
            .filter(|file| {
                file.parent()
                    .and_then(Path::file_name)
                    .and_then(|name| name.to_str())
                    .and_then(parse_run_dir_name)
                    .is_some_and(|(_, run_token)| run_token == token)
            })
            .collect()
    }

    fn read_file(path: &Path) -> Entries {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not read cache {}: {}", path.display(), e);
                }
                return Entries::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                Entries::new()
            }
        }
    }

    fn load_scope(scope: &CacheScope) -> Entries {
        let mut merged = Entries::new();
        let mut files = Self::model_files(&scope.case_dir, &scope.model.token());
        if !files.contains(&scope.write_path) {
            files.push(scope.write_path.clone());
        }
        // Run directories sort by date, so newer files override older ones
        for file in &files {
            merged.extend(Self::read_file(file));
        }
        debug!(
            "Loaded {} cached answers for {} from {} file(s)",
            merged.len(),
            scope.model,
            files.len()
        );
        merged
    }
}

#[async_trait]
impl CacheStore for JsonCacheStore {
    async fn lookup(&self, scope: &CacheScope, key: &CacheKey) -> Option<CacheEntry> {
        let mut scopes = self.scopes.lock().await;
        scopes
            .entry(scope.write_path.clone())
            .or_insert_with(|| Self::load_scope(scope))
            .get(key)
            .cloned()
    }

    async fn store(
        &self,
        scope: &CacheScope,
        key: CacheKey,
        entry: CacheEntry,
    ) -> Result<(), CacheError> {
        let mut scopes = self.scopes.lock().await;
        let entries = scopes
            .entry(scope.write_path.clone())
            .or_insert_with(|| Self::load_scope(scope));
        entries.insert(key, entry);

        let write_error = |message: String| CacheError::Write {
            path: scope.write_path.clone(),
            message,
        };
        let json = serde_json::to_string_pretty(entries).map_err(|e| write_error(e.to_string()))?;
        write_atomic(&scope.write_path, json.as_bytes()).map_err(|e| write_error(e.to_string()))
    }

    async fn reset(&self, target: &CacheResetTarget) -> Result<usize, CacheError> {
        let mut scopes = self.scopes.lock().await;

        let files = match target {
            CacheResetTarget::Model { case_dir, model } => {
                Self::model_files(case_dir, &model.token())
            }
            CacheResetTarget::All { case_dir } => {
                glob_sorted(case_dir, &format!("*/{}", CACHE_FILE_NAME))
            }
        };

        for file in &files {
            std::fs::remove_file(file).map_err(|e| CacheError::Remove {
                path: file.clone(),
                message: e.to_string(),
            })?;
            debug!("Removed {}", file.display());
        }

        scopes.retain(|write_path, _| !write_path.starts_with(target.case_dir()));
        Ok(files.len())
    }
}
