//! Application layer for themis
//!
//! This crate contains use cases, port definitions, and pipeline parameters.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{PipelineParams, RetryPolicy};
pub use ports::{
    PipelinePorts,
    artifact_store::{ArtifactStore, PersistenceError},
    cache_store::{CacheError, CacheStore},
    call_logger::{CallEvent, CallLogOpener, CallLogger, NoCallLogger},
    document_source::{DocumentListError, DocumentRef, DocumentSource, ExtractionError},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, ProgressEvent, ProgressNotifier},
    question_source::{QuestionLoadError, QuestionSource},
};
pub use use_cases::analyze_document::{AnalysisError, AnalyzeDocumentUseCase};
pub use use_cases::assemble_report::{AssembleReportUseCase, ReportPaths};
pub use use_cases::clear_cache::ClearCacheUseCase;
pub use use_cases::run_all_models::{
    BatchError, RunAllModelsInput, RunAllModelsOutput, RunAllModelsUseCase,
};
pub use use_cases::run_case_analysis::{
    RunCaseAnalysisInput, RunCaseAnalysisOutput, RunCaseAnalysisUseCase,
};
pub use use_cases::run_pipeline::{
    DefendInput, FullProcessInput, PipelineError, PipelineOutput, RunPipelineUseCase,
};
pub use use_cases::synthesize_defense::{DefenseError, SynthesizeDefenseUseCase};
