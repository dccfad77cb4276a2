//! Analyze Document use case
//!
//! Answers every question of a [`QuestionSet`] for one document, serving
//! answers from the cache when the key matches exactly.

use crate::config::PipelineParams;
use crate::ports::artifact_store::PersistenceError;
use crate::ports::cache_store::{CacheError, CacheStore};
use crate::ports::call_logger::{CallEvent, CallLogger};
use crate::ports::document_source::{
    DocumentListError, DocumentRef, DocumentSource, ExtractionError,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use crate::use_cases::shared::{CallError, Cancelled, check_cancelled, complete_with_retry};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use themis_domain::util::preview;
use themis_domain::{
    CacheEntry, CacheKey, CacheScope, DocumentIdentity, DocumentRecord, DomainError, Model,
    PromptTemplate, QaPair, QuestionSet,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 100;

/// Errors raised while analyzing documents
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No PDF documents found in {}", .0.display())]
    NoDocumentsFound(PathBuf),

    #[error(transparent)]
    DocumentListing(#[from] DocumentListError),

    #[error("Extraction failed for {file_name}: {source}")]
    ExtractionFailure {
        file_name: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Backend failed on every question: {0}")]
    BackendFailure(GatewayError),

    #[error("Cache write failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Artifact write failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Could not serialize analysis: {0}")]
    Serialization(#[from] DomainError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Failures confined to one document
    pub fn is_document_local(&self) -> bool {
        matches!(
            self,
            Self::ExtractionFailure { .. } | Self::BackendFailure(_)
        )
    }
}

impl From<Cancelled> for AnalysisError {
    fn from(_: Cancelled) -> Self {
        AnalysisError::Cancelled
    }
}

/// Use case for answering the question set against one document
pub struct AnalyzeDocumentUseCase {
    gateway: Arc<dyn LlmGateway>,
    documents: Arc<dyn DocumentSource>,
    cache: Arc<dyn CacheStore>,
    call_logger: Arc<dyn CallLogger>,
    params: PipelineParams,
    cancellation_token: Option<CancellationToken>,
}

impl AnalyzeDocumentUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        documents: Arc<dyn DocumentSource>,
        cache: Arc<dyn CacheStore>,
        call_logger: Arc<dyn CallLogger>,
        params: PipelineParams,
        cancellation_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            gateway,
            documents,
            cache,
            call_logger,
            params,
            cancellation_token,
        }
    }

    /// Produce the [`DocumentRecord`] for `document`.
    ///
    /// Text is extracted only when the first cache miss needs it, so a fully
    /// cached document is never parsed. A question that keeps failing gets a
    /// placeholder answer. When extraction fails, cached answers are kept and
    /// only the missed questions get placeholders. The whole document fails
    /// only when no question could be answered at all.
    pub async fn analyze(
        &self,
        document: &DocumentRef,
        questions: &QuestionSet,
        model: &Model,
        cache_scope: &CacheScope,
        progress: &dyn ProgressNotifier,
    ) -> Result<DocumentRecord, AnalysisError> {
        let signature = self
            .documents
            .content_signature(document)
            .await
            .map_err(|source| AnalysisError::ExtractionFailure {
                file_name: document.file_name.clone(),
                source,
            })?;
        let identity = DocumentIdentity::new(&document.file_name, signature);

        let total = questions.len();
        let mut text: Option<String> = None;
        let mut extraction_failure: Option<AnalysisError> = None;
        let mut answers = Vec::with_capacity(total);
        let mut last_backend_error = None;

        for question in questions {
            check_cancelled(&self.cancellation_token)?;

            let started = Instant::now();
            let key = CacheKey::derive(&identity, question, model);

            if let Some(entry) = self.cache.lookup(cache_scope, &key).await {
                debug!(
                    document = %document.file_name,
                    position = question.position(),
                    "Cache hit"
                );
                progress.on_progress(&ProgressEvent::QuestionAnswered {
                    position: question.position(),
                    total,
                    from_cache: true,
                    preview: preview(&entry.answer, PREVIEW_CHARS),
                    elapsed: started.elapsed(),
                });
                answers.push(QaPair::answered(question.text(), entry.answer));
                continue;
            }

            if text.is_none() && extraction_failure.is_none() {
                match self.extract(document, progress).await {
                    Ok(extracted) => text = Some(extracted),
                    Err(e) => {
                        warn!(document = %document.file_name, "{}", e);
                        extraction_failure = Some(e);
                    }
                }
            }
            if let Some(failure) = &extraction_failure {
                let reason = failure.to_string();
                progress.on_progress(&ProgressEvent::QuestionFailed {
                    position: question.position(),
                    total,
                    reason: reason.clone(),
                });
                answers.push(QaPair::failed(question.text(), reason));
                continue;
            }
            let document_text = text.as_deref().unwrap_or_default();

            let prompt = PromptTemplate::document_question(
                question.text(),
                document_text,
                self.params.document_char_budget,
            );

            match complete_with_retry(
                self.gateway.as_ref(),
                model,
                &prompt,
                &self.params.retry,
                progress,
                &self.cancellation_token,
            )
            .await
            {
                Ok(answer) => {
                    let answer = answer.trim().to_string();
                    self.cache
                        .store(
                            cache_scope,
                            key.clone(),
                            CacheEntry::new(question.text(), answer.clone()),
                        )
                        .await?;

                    let elapsed = started.elapsed();
                    self.call_logger.log(CallEvent::new(
                        "question_answered",
                        json!({
                            "document": document.file_name,
                            "position": question.position(),
                            "model": model.as_str(),
                            "cache_key": key.as_str(),
                            "prompt_chars": prompt.chars().count(),
                            "answer_chars": answer.chars().count(),
                            "elapsed_ms": elapsed.as_millis() as u64,
                        }),
                    ));
                    progress.on_progress(&ProgressEvent::QuestionAnswered {
                        position: question.position(),
                        total,
                        from_cache: false,
                        preview: preview(&answer, PREVIEW_CHARS),
                        elapsed,
                    });
                    answers.push(QaPair::answered(question.text(), answer));
                }
                Err(CallError::Cancelled) => return Err(AnalysisError::Cancelled),
                Err(CallError::Gateway(error)) => {
                    warn!(
                        document = %document.file_name,
                        position = question.position(),
                        "Question failed: {}",
                        error
                    );
                    self.call_logger.log(CallEvent::new(
                        "question_failed",
                        json!({
                            "document": document.file_name,
                            "position": question.position(),
                            "model": model.as_str(),
                            "error": error.to_string(),
                            "elapsed_ms": started.elapsed().as_millis() as u64,
                        }),
                    ));
                    progress.on_progress(&ProgressEvent::QuestionFailed {
                        position: question.position(),
                        total,
                        reason: error.to_string(),
                    });
                    answers.push(QaPair::failed(question.text(), error.to_string()));
                    last_backend_error = Some(error);
                }
            }
        }

        if answers.iter().all(QaPair::is_failed) {
            if let Some(failure) = extraction_failure {
                return Err(failure);
            }
            if let Some(error) = last_backend_error {
                return Err(AnalysisError::BackendFailure(error));
            }
        }

        Ok(DocumentRecord::new(&document.file_name, answers))
    }

    async fn extract(
        &self,
        document: &DocumentRef,
        progress: &dyn ProgressNotifier,
    ) -> Result<String, AnalysisError> {
        let failure = |source| AnalysisError::ExtractionFailure {
            file_name: document.file_name.clone(),
            source,
        };

        let text = self
            .documents
            .extract_text(document)
            .await
            .map_err(failure)?;
        if text.trim().is_empty() {
            return Err(failure(ExtractionError::Empty));
        }

        let chars = text.chars().count();
        info!(document = %document.file_name, chars, "Extracted text");
        progress.on_progress(&ProgressEvent::TextExtracted {
            file_name: document.file_name.clone(),
            chars,
        });
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::call_logger::NoCallLogger;
    use crate::ports::progress::NoProgress;
    use crate::use_cases::test_support::{
        MemoryCache, MemoryDocuments, RecordingProgress, ScriptedGateway, quick_params,
    };
    use std::path::Path;

    const CASE: &str = "/cases/doe";

    struct Fixture {
        gateway: Arc<ScriptedGateway>,
        documents: Arc<MemoryDocuments>,
        cache: Arc<MemoryCache>,
    }

    impl Fixture {
        fn new() -> Self {
            let documents = MemoryDocuments::new();
            documents.add(CASE, "indictment.pdf", "The defendant is charged with fraud.");
            Self {
                gateway: Arc::new(ScriptedGateway::new()),
                documents: Arc::new(documents),
                cache: Arc::new(MemoryCache::new()),
            }
        }

        fn use_case(&self) -> AnalyzeDocumentUseCase {
            AnalyzeDocumentUseCase::new(
                self.gateway.clone(),
                self.documents.clone(),
                self.cache.clone(),
                Arc::new(NoCallLogger),
                quick_params(),
                None,
            )
        }

        fn document(&self) -> DocumentRef {
            DocumentRef::new(Path::new(CASE).join("indictment.pdf"))
        }
    }

    fn scope(model: &Model) -> CacheScope {
        CacheScope::new(CASE, model.clone(), "/cases/doe/run/analysis_cache.json")
    }

    fn questions(texts: &[&str]) -> QuestionSet {
        QuestionSet::from_texts(texts.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn test_answers_and_caches_each_question() {
        let fx = Fixture::new();
        let model = Model::new("m1");
        let qs = questions(&["What charges?", "What evidence?"]);

        let record = fx
            .use_case()
            .analyze(&fx.document(), &qs, &model, &scope(&model), &NoProgress)
            .await
            .unwrap();

        assert_eq!(record.filename, "indictment.pdf");
        assert_eq!(record.answers.len(), 2);
        assert_eq!(record.answers[0].question, "What charges?");
        assert!(!record.is_degraded());
        assert_eq!(fx.gateway.calls(), 2);
        assert_eq!(fx.cache.len(CASE, &model), 2);
    }

    #[tokio::test]
    async fn test_fully_cached_document_is_not_extracted() {
        let fx = Fixture::new();
        let model = Model::new("m1");
        let qs = questions(&["What charges?", "What evidence?"]);
        let uc = fx.use_case();

        let first = uc
            .analyze(&fx.document(), &qs, &model, &scope(&model), &NoProgress)
            .await
            .unwrap();
        let second = uc
            .analyze(&fx.document(), &qs, &model, &scope(&model), &NoProgress)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.gateway.calls(), 2);
        assert_eq!(fx.documents.extractions(), 1);
    }

    #[tokio::test]
    async fn test_failed_question_gets_placeholder() {
        let fx = Fixture::new();
        let model = Model::new("m1");
        fx.gateway.push_reply("m1", "Wire fraud.");
        fx.gateway
            .push_error("m1", GatewayError::ModelNotAvailable("m1".into()));
        let qs = questions(&["What charges?", "What evidence?"]);
        let progress = RecordingProgress::new();

        let record = fx
            .use_case()
            .analyze(&fx.document(), &qs, &model, &scope(&model), &progress)
            .await
            .unwrap();

        assert_eq!(record.answers[0].answer, "Wire fraud.");
        assert!(record.answers[1].is_failed());
        assert!(record.answers[1].answer.starts_with("[analysis failed:"));
        // Placeholders are never cached
        assert_eq!(fx.cache.len(CASE, &model), 1);
        assert_eq!(progress.count(|e| matches!(e, ProgressEvent::QuestionFailed { .. })), 1);
    }

    #[tokio::test]
    async fn test_every_question_failing_is_backend_failure() {
        let fx = Fixture::new();
        let model = Model::new("m1");
        fx.gateway
            .fail_model("m1", GatewayError::ConnectionError("refused".into()));
        let qs = questions(&["What charges?", "What evidence?"]);

        let result = fx
            .use_case()
            .analyze(&fx.document(), &qs, &model, &scope(&model), &NoProgress)
            .await;

        assert!(matches!(result, Err(AnalysisError::BackendFailure(_))));
        assert_eq!(fx.cache.len(CASE, &model), 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_extraction_failure() {
        let fx = Fixture::new();
        fx.documents.add(CASE, "scan.pdf", "   \n ");
        let model = Model::new("m1");
        let qs = questions(&["What charges?"]);

        let result = fx
            .use_case()
            .analyze(
                &DocumentRef::new(Path::new(CASE).join("scan.pdf")),
                &qs,
                &model,
                &scope(&model),
                &NoProgress,
            )
            .await;

        assert!(matches!(
            result,
            Err(AnalysisError::ExtractionFailure {
                source: ExtractionError::Empty,
                ..
            })
        ));
        assert_eq!(fx.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_keeps_cached_answers() {
        let fx = Fixture::new();
        let model = Model::new("m1");
        let document = DocumentRef::new(Path::new(CASE).join("exhibit.pdf"));
        fx.documents.add(CASE, "exhibit.pdf", "Ledger of transfers.");
        fx.use_case()
            .analyze(
                &document,
                &questions(&["What charges?"]),
                &model,
                &scope(&model),
                &NoProgress,
            )
            .await
            .unwrap();

        // Same bytes, but the extractor now fails; a second question is added
        fx.documents.break_extractor(CASE, "exhibit.pdf");
        let progress = RecordingProgress::new();
        let record = fx
            .use_case()
            .analyze(
                &document,
                &questions(&["What charges?", "What evidence?"]),
                &model,
                &scope(&model),
                &progress,
            )
            .await
            .unwrap();

        assert!(!record.answers[0].is_failed());
        assert!(record.answers[1].is_failed());
        assert!(record.answers[1].answer.contains("exhibit.pdf"));
        assert_eq!(fx.gateway.calls(), 1);
        assert_eq!(progress.count(|e| matches!(e, ProgressEvent::QuestionFailed { .. })), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_aborts() {
        let fx = Fixture::new();
        fx.cache.fail_writes();
        let model = Model::new("m1");
        let qs = questions(&["What charges?"]);

        let result = fx
            .use_case()
            .analyze(&fx.document(), &qs, &model, &scope(&model), &NoProgress)
            .await;

        assert!(matches!(result, Err(AnalysisError::Cache(_))));
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_question() {
        let fx = Fixture::new();
        let token = CancellationToken::new();
        token.cancel();
        let uc = AnalyzeDocumentUseCase::new(
            fx.gateway.clone(),
            fx.documents.clone(),
            fx.cache.clone(),
            Arc::new(NoCallLogger),
            quick_params(),
            Some(token),
        );
        let model = Model::new("m1");

        let result = uc
            .analyze(
                &fx.document(),
                &questions(&["What charges?"]),
                &model,
                &scope(&model),
                &NoProgress,
            )
            .await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(fx.gateway.calls(), 0);
    }
}
