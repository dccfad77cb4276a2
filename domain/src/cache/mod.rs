//! Answer cache: keys, entries and scopes.

pub mod entry;
pub mod key;

pub use entry::{CacheEntry, CacheResetTarget, CacheScope};
pub use key::{CacheKey, DocumentIdentity};
