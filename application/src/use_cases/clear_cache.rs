//! Clear Cache use case

use crate::ports::cache_store::{CacheError, CacheStore};
use std::sync::Arc;
use themis_domain::CacheResetTarget;
use tracing::info;

pub struct ClearCacheUseCase {
    cache: Arc<dyn CacheStore>,
}

impl ClearCacheUseCase {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Remove the caches named by `target`; returns how many were removed.
    pub async fn execute(&self, target: &CacheResetTarget) -> Result<usize, CacheError> {
        let removed = self.cache.reset(target).await?;
        info!(
            case_dir = %target.case_dir().display(),
            removed,
            "Cleared analysis cache"
        );
        Ok(removed)
    }
}
