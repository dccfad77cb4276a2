//! File system persistence: run artifacts and the answer cache

mod artifact_store;
mod atomic;
mod json_cache;

pub use artifact_store::LocalArtifactStore;
pub use atomic::write_atomic;
pub use json_cache::JsonCacheStore;
