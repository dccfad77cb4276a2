//! Cache store port
//!
//! Exact-match keyed storage of answers, scoped to a (case directory, model)
//! pair. `store` must be durable before it returns.

use async_trait::async_trait;
use std::path::PathBuf;
use themis_domain::{CacheEntry, CacheKey, CacheResetTarget, CacheScope};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Could not write cache {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Could not remove cache {path}: {message}")]
    Remove { path: PathBuf, message: String },
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn lookup(&self, scope: &CacheScope, key: &CacheKey) -> Option<CacheEntry>;

    async fn store(
        &self,
        scope: &CacheScope,
        key: CacheKey,
        entry: CacheEntry,
    ) -> Result<(), CacheError>;

    /// Remove caches; returns the number of cache files deleted
    async fn reset(&self, target: &CacheResetTarget) -> Result<usize, CacheError>;
}
