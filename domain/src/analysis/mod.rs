//! Document analysis: per-document Q&A records, the case-level artifact,
//! and its markdown rendering.

pub mod anchor;
pub mod entities;
pub mod render;

pub use anchor::{document_anchor, question_anchors, slug};
pub use entities::{CaseAnalysisArtifact, DocumentRecord, QaPair};
pub use render::render_analysis_markdown;
