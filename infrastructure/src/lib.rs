//! Infrastructure layer for themis
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the Ollama backend, PDF documents, the
//! question file, JSON cache and artifact storage, the JSONL call log,
//! and configuration file loading.

pub mod config;
pub mod documents;
pub mod logging;
pub mod ollama;
pub mod questions;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, ConfigValidationError, FileAnalysisConfig, FileConfig};
pub use documents::PdfDocumentSource;
pub use logging::{JsonlCallLogOpener, JsonlCallLogger};
pub use ollama::{OllamaGateway, base_url};
pub use questions::MarkdownQuestionFile;
pub use storage::{JsonCacheStore, LocalArtifactStore};
