//! PDF documents of a case directory
//!
//! Text comes from the embedded text layer via `pdf-extract`. Scanned PDFs
//! without one extract as blank and are reported as [`ExtractionError::Empty`].

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use themis_application::ports::document_source::{
    DocumentListError, DocumentRef, DocumentSource, ExtractionError,
};
use themis_domain::cache::key::to_hex;
use tracing::debug;

/// [`DocumentSource`] over the `*.pdf` files of a directory
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfDocumentSource;

impl PdfDocumentSource {
    pub fn new() -> Self {
        Self
    }

    async fn read_bytes(document: &DocumentRef) -> Result<Vec<u8>, ExtractionError> {
        tokio::fs::read(&document.path)
            .await
            .map_err(|e| ExtractionError::Io {
                path: document.path.clone(),
                message: e.to_string(),
            })
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[async_trait]
impl DocumentSource for PdfDocumentSource {
    async fn list_documents(&self, case_dir: &Path) -> Result<Vec<DocumentRef>, DocumentListError> {
        if !case_dir.is_dir() {
            return Err(DocumentListError::NotFound(case_dir.to_path_buf()));
        }

        let io_error = |e: std::io::Error| DocumentListError::Io {
            path: case_dir.to_path_buf(),
            message: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(case_dir).await.map_err(io_error)?;
        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.is_file() && is_pdf(&path) {
                documents.push(DocumentRef::new(path));
            }
        }

        documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        debug!("Found {} PDFs in {}", documents.len(), case_dir.display());
        Ok(documents)
    }

    async fn content_signature(&self, document: &DocumentRef) -> Result<String, ExtractionError> {
        let bytes = Self::read_bytes(document).await?;
        Ok(to_hex(&Sha256::digest(&bytes)))
    }

    async fn extract_text(&self, document: &DocumentRef) -> Result<String, ExtractionError> {
        let bytes = Self::read_bytes(document).await?;

        // pdf-extract is CPU bound and synchronous
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractionError::Extractor(e.to_string()))?
            .map_err(|e| ExtractionError::Extractor(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }
        debug!("Extracted {} chars from {}", text.len(), document.file_name);
        Ok(text)
    }
}
