//! In-memory port implementations shared by the use case tests.

use crate::config::{PipelineParams, RetryPolicy};
use crate::ports::PipelinePorts;
use crate::ports::artifact_store::{ArtifactStore, PersistenceError};
use crate::ports::cache_store::{CacheError, CacheStore};
use crate::ports::call_logger::NoCallLogger;
use crate::ports::document_source::{
    DocumentListError, DocumentRef, DocumentSource, ExtractionError,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use crate::ports::question_source::{QuestionLoadError, QuestionSource};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use themis_domain::{CacheEntry, CacheKey, CacheResetTarget, CacheScope, Model, QuestionSet};

pub(crate) fn quick_params() -> PipelineParams {
    PipelineParams::default().with_retry(RetryPolicy::new(2, Duration::from_millis(1)))
}

// ==================== Gateway ====================

/// Gateway answering from per-model scripts.
///
/// Scripted results are consumed first; after that a model either keeps
/// failing (`fail_model`) or answers with a generated reply.
pub(crate) struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, GatewayError>>>>,
    failing: Mutex<HashMap<String, GatewayError>>,
    listed: Mutex<Result<Vec<Model>, GatewayError>>,
    prompts: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashMap::new()),
            listed: Mutex::new(Ok(Vec::new())),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push_reply(&self, model: &str, reply: &str) {
        self.push(model, Ok(reply.to_string()));
    }

    pub fn push_error(&self, model: &str, error: GatewayError) {
        self.push(model, Err(error));
    }

    fn push(&self, model: &str, result: Result<String, GatewayError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn fail_model(&self, model: &str, error: GatewayError) {
        self.failing
            .lock()
            .unwrap()
            .insert(model.to_string(), error);
    }

    pub fn list_models(&self, models: &[&str]) {
        *self.listed.lock().unwrap() = Ok(models.iter().map(|m| Model::new(*m)).collect());
    }

    pub fn fail_listing(&self, error: GatewayError) {
        *self.listed.lock().unwrap() = Err(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .count()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, model: &Model, prompt: &str) -> Result<String, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));

        if let Some(result) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(model.as_str())
            .and_then(|queue| queue.pop_front())
        {
            return result;
        }
        if let Some(error) = self.failing.lock().unwrap().get(model.as_str()) {
            return Err(error.clone());
        }
        Ok(format!("{} answer #{}", model, n))
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        self.listed.lock().unwrap().clone()
    }

    async fn server_version(&self) -> Result<String, GatewayError> {
        Ok("0.0.0-test".to_string())
    }
}

// ==================== Documents ====================

struct MemoryDocument {
    path: PathBuf,
    text: Result<String, ExtractionError>,
}

/// Case directories held in memory; signatures are the text itself
pub(crate) struct MemoryDocuments {
    documents: Mutex<Vec<MemoryDocument>>,
    broken_extractor: Mutex<Vec<PathBuf>>,
    extractions: AtomicUsize,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            broken_extractor: Mutex::new(Vec::new()),
            extractions: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, case_dir: &str, file_name: &str, text: &str) {
        self.insert(case_dir, file_name, Ok(text.to_string()));
    }

    pub fn add_unreadable(&self, case_dir: &str, file_name: &str) {
        self.insert(
            case_dir,
            file_name,
            Err(ExtractionError::Extractor("corrupt xref table".to_string())),
        );
    }

    /// Keep the file's content signature but make its extraction fail
    pub fn break_extractor(&self, case_dir: &str, file_name: &str) {
        self.broken_extractor
            .lock()
            .unwrap()
            .push(Path::new(case_dir).join(file_name));
    }

    fn insert(&self, case_dir: &str, file_name: &str, text: Result<String, ExtractionError>) {
        let path = Path::new(case_dir).join(file_name);
        let mut documents = self.documents.lock().unwrap();
        documents.retain(|d| d.path != path);
        documents.push(MemoryDocument { path, text });
    }

    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }

    fn text_of(&self, document: &DocumentRef) -> Result<String, ExtractionError> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.path == document.path)
            .map(|d| d.text.clone())
            .unwrap_or_else(|| {
                Err(ExtractionError::Io {
                    path: document.path.clone(),
                    message: "no such file".to_string(),
                })
            })
    }
}

#[async_trait]
impl DocumentSource for MemoryDocuments {
    async fn list_documents(
        &self,
        case_dir: &Path,
    ) -> Result<Vec<DocumentRef>, DocumentListError> {
        let mut refs: Vec<DocumentRef> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.path.parent() == Some(case_dir))
            .map(|d| DocumentRef::new(&d.path))
            .collect();
        refs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(refs)
    }

    async fn content_signature(&self, document: &DocumentRef) -> Result<String, ExtractionError> {
        match self.text_of(document) {
            Ok(text) => Ok(format!("sig:{}", text)),
            Err(ExtractionError::Io { path, message }) => Err(ExtractionError::Io { path, message }),
            Err(_) => Ok(format!("sig:unreadable:{}", document.file_name)),
        }
    }

    async fn extract_text(&self, document: &DocumentRef) -> Result<String, ExtractionError> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        if self.broken_extractor.lock().unwrap().contains(&document.path) {
            return Err(ExtractionError::Extractor("extractor crashed".to_string()));
        }
        self.text_of(document)
    }
}

// ==================== Questions ====================

/// Question files held in memory.
///
/// Each path holds a queue of contents; every load consumes one until the
/// last, which then stays. This models a file edited between documents.
pub(crate) struct MemoryQuestions {
    files: Mutex<HashMap<PathBuf, VecDeque<Vec<String>>>>,
    loads: AtomicUsize,
}

impl MemoryQuestions {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, path: &str, questions: &[&str]) {
        let mut files = self.files.lock().unwrap();
        let queue = files.entry(PathBuf::from(path)).or_default();
        queue.clear();
        queue.push_back(questions.iter().map(|q| q.to_string()).collect());
    }

    pub fn then(&self, path: &str, questions: &[&str]) {
        self.files
            .lock()
            .unwrap()
            .entry(PathBuf::from(path))
            .or_default()
            .push_back(questions.iter().map(|q| q.to_string()).collect());
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl QuestionSource for MemoryQuestions {
    fn load(&self, path: &Path) -> Result<QuestionSet, QuestionLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock().unwrap();
        let queue = files
            .get_mut(path)
            .ok_or_else(|| QuestionLoadError::NotFound(path.to_path_buf()))?;
        let texts = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        QuestionSet::from_texts(texts).ok_or_else(|| QuestionLoadError::NoQuestions(path.to_path_buf()))
    }
}

// ==================== Cache ====================

type ScopeKey = (PathBuf, Model);

pub(crate) struct MemoryCache {
    entries: Mutex<HashMap<ScopeKey, BTreeMap<CacheKey, CacheEntry>>>,
    stores: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stores: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn len(&self, case_dir: &str, model: &Model) -> usize {
        self.entries
            .lock()
            .unwrap()
            .get(&(PathBuf::from(case_dir), model.clone()))
            .map(|e| e.len())
            .unwrap_or(0)
    }

    pub fn snapshot(&self, case_dir: &str, model: &Model) -> BTreeMap<CacheKey, CacheEntry> {
        self.entries
            .lock()
            .unwrap()
            .get(&(PathBuf::from(case_dir), model.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn lookup(&self, scope: &CacheScope, key: &CacheKey) -> Option<CacheEntry> {
        self.entries
            .lock()
            .unwrap()
            .get(&(scope.case_dir.clone(), scope.model.clone()))
            .and_then(|entries| entries.get(key).cloned())
    }

    async fn store(
        &self,
        scope: &CacheScope,
        key: CacheKey,
        entry: CacheEntry,
    ) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Write {
                path: scope.write_path.clone(),
                message: "disk full".to_string(),
            });
        }
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .entry((scope.case_dir.clone(), scope.model.clone()))
            .or_default()
            .insert(key, entry);
        Ok(())
    }

    async fn reset(&self, target: &CacheResetTarget) -> Result<usize, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        match target {
            CacheResetTarget::Model { case_dir, model } => {
                entries.retain(|(dir, m), _| !(dir == case_dir && m == model));
            }
            CacheResetTarget::All { case_dir } => {
                entries.retain(|(dir, _), _| dir != case_dir);
            }
        }
        Ok(before - entries.len())
    }
}

// ==================== Artifacts ====================

pub(crate) struct MemoryArtifacts {
    files: Mutex<BTreeMap<PathBuf, String>>,
    fail_writes: AtomicBool,
}

impl MemoryArtifacts {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn put(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.to_string());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn write_text(&self, path: &Path, contents: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Write {
                path: path.to_path_buf(),
                message: "read-only file system".to_string(),
            });
        }
        self.put(path, contents);
        Ok(())
    }

    async fn read_text(&self, path: &Path) -> Result<String, PersistenceError> {
        self.get(path)
            .ok_or_else(|| PersistenceError::NotFound(path.to_path_buf()))
    }

    async fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    /// Supports the single `*_<token>/<file>` shape the pipeline asks for.
    async fn find(&self, dir: &Path, pattern: &str) -> Vec<PathBuf> {
        let Some((dir_pattern, file_name)) = pattern.split_once('/') else {
            return Vec::new();
        };
        let suffix = dir_pattern.trim_start_matches('*');
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter(|path| {
                path.file_name().is_some_and(|n| n == file_name)
                    && path.parent().is_some_and(|parent| {
                        parent.parent() == Some(dir)
                            && parent
                                .file_name()
                                .is_some_and(|n| n.to_string_lossy().ends_with(suffix))
                    })
            })
            .cloned()
            .collect()
    }
}

// ==================== Progress ====================

pub(crate) struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl ProgressNotifier for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ==================== Wiring ====================

pub(crate) struct TestPorts {
    pub gateway: Arc<ScriptedGateway>,
    pub documents: Arc<MemoryDocuments>,
    pub questions: Arc<MemoryQuestions>,
    pub cache: Arc<MemoryCache>,
    pub artifacts: Arc<MemoryArtifacts>,
}

impl TestPorts {
    pub fn new() -> Self {
        Self {
            gateway: Arc::new(ScriptedGateway::new()),
            documents: Arc::new(MemoryDocuments::new()),
            questions: Arc::new(MemoryQuestions::new()),
            cache: Arc::new(MemoryCache::new()),
            artifacts: Arc::new(MemoryArtifacts::new()),
        }
    }

    pub fn ports(&self) -> PipelinePorts {
        PipelinePorts {
            gateway: self.gateway.clone(),
            documents: self.documents.clone(),
            questions: self.questions.clone(),
            cache: self.cache.clone(),
            artifacts: self.artifacts.clone(),
            call_logs: Arc::new(NoCallLogger),
        }
    }
}
