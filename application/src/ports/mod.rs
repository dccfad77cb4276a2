//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod artifact_store;
pub mod cache_store;
pub mod call_logger;
pub mod document_source;
pub mod llm_gateway;
pub mod progress;
pub mod question_source;

use std::sync::Arc;

/// Every adapter a pipeline run talks to
#[derive(Clone)]
pub struct PipelinePorts {
    pub gateway: Arc<dyn llm_gateway::LlmGateway>,
    pub documents: Arc<dyn document_source::DocumentSource>,
    pub questions: Arc<dyn question_source::QuestionSource>,
    pub cache: Arc<dyn cache_store::CacheStore>,
    pub artifacts: Arc<dyn artifact_store::ArtifactStore>,
    pub call_logs: Arc<dyn call_logger::CallLogOpener>,
}
