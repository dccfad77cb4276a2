//! Cache key fingerprints

use crate::core::model::Model;
use crate::core::question::Question;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a source document as far as caching is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    /// File name relative to the case directory
    pub file_name: String,
    /// Hex SHA-256 of the document bytes
    pub content_signature: String,
}

impl DocumentIdentity {
    pub fn new(file_name: impl Into<String>, content_signature: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content_signature: content_signature.into(),
        }
    }
}

/// Fingerprint identifying one cached answer.
///
/// Derived from the document identity, the question's position and text,
/// and the model identifier. Any change in those inputs yields a different
/// key; nothing else (dates, prompt budgets) participates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(document: &DocumentIdentity, question: &Question, model: &Model) -> Self {
        let mut hasher = Sha256::new();
        for field in [
            document.file_name.as_str(),
            document.content_signature.as_str(),
            &question.position().to_string(),
            question.text(),
            model.as_str(),
        ] {
            // length prefix keeps ("ab", "c") and ("a", "bc") apart
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(to_hex(&hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase hex encoding of a digest
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
