//! Document source port
//!
//! Lists the PDFs of a case directory and turns them into text. Extraction
//! itself is opaque to the application layer.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A source document inside a case directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub file_name: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, file_name }
    }
}

/// Why a document produced no usable text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Text extraction failed: {0}")]
    Extractor(String),

    #[error("Document contains no extractable text")]
    Empty,
}

/// Errors listing a case directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentListError {
    #[error("Case directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Could not read case directory {path}: {message}")]
    Io { path: PathBuf, message: String },
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// PDFs directly inside `case_dir`, ordered by file name
    async fn list_documents(&self, case_dir: &Path) -> Result<Vec<DocumentRef>, DocumentListError>;

    /// Hex SHA-256 of the document bytes
    async fn content_signature(&self, document: &DocumentRef) -> Result<String, ExtractionError>;

    /// Extracted text.
    ///
    /// Returns the text as extracted, possibly blank; callers decide whether
    /// blank text is usable.
    async fn extract_text(&self, document: &DocumentRef) -> Result<String, ExtractionError>;
}
