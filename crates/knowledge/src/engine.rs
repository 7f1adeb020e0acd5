//! The knowledge engine: ingestion and question answering over a vector
//! store, gated by the availability of its dependencies.
//!
//! The engine starts `Uninitialized`. [`KnowledgeEngine::initialize`] checks
//! the vector store, the embedding provider and the generation provider and
//! moves to `Active` or `Degraded`. A lost connection seen by any later call
//! moves an `Active` engine to `Degraded`; only another `initialize` brings
//! it back. Timeouts are reported to the caller and change nothing.

use crate::chunker::Chunker;
use crate::embeddings::{self, EmbeddingProvider};
use crate::history::{self, ConversationTurn};
use crate::loader::{self, Document};
use crate::store::{self, VectorStore};
use crate::types::{Collection, Fragment, ScoredFragment, VectorRecord};
use abunda_core::config::{
    ChunkingSettings, GenerationMode, GenerationSettings, HistorySettings, RetrievalSettings,
};
use abunda_core::{AppConfig, AppError, AppResult};
use abunda_llm::{
    create_client, select_model, ChatSession, GenerationOptions, LlmClient, LlmRequest,
};
use abunda_prompt::{
    build_prompt, default_prompt, load_prompt_or_default, ContextFragment, PromptContext,
    PromptDefinition,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

const OFFLINE_MESSAGE: &str = "Abunda is offline right now";
const EMPTY_MESSAGE: &str =
    "The knowledge base is empty. Ingest some documents first, then ask again.";
const GENERATION_FAILED_MESSAGE: &str =
    "Sorry, I could not produce an answer just now. Please try again in a moment.";
const RETRIEVAL_FAILED_MESSAGE: &str =
    "Sorry, I could not search the knowledge base just now. Please try again in a moment.";

/// A dependency the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dependency {
    VectorStore,
    Embedding,
    Generation,
    Configuration,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dependency::VectorStore => "vector store",
            Dependency::Embedding => "embedding provider",
            Dependency::Generation => "generation provider",
            Dependency::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Why a dependency is considered failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFailure {
    pub dependency: Dependency,
    pub reason: String,
}

impl DependencyFailure {
    fn new(dependency: Dependency, error: &AppError) -> Self {
        Self {
            dependency,
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for DependencyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dependency, self.reason)
    }
}

/// Lifecycle state of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EngineState {
    Uninitialized,
    Active,
    Degraded { failures: Vec<DependencyFailure> },
}

impl EngineState {
    pub fn is_active(&self) -> bool {
        matches!(self, EngineState::Active)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Active => "active",
            EngineState::Degraded { .. } => "degraded",
        }
    }

    pub fn failures(&self) -> &[DependencyFailure] {
        match self {
            EngineState::Degraded { failures } => failures,
            _ => &[],
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub document_id: String,
    pub fragment_count: usize,
    pub collection: String,
}

/// Per-document ingestion outcome as reported to the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub document_id: String,
    pub success: bool,
    pub fragment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestOutcome {
    pub fn from_result(document_id: impl Into<String>, result: &AppResult<IngestReport>) -> Self {
        match result {
            Ok(report) => Self {
                document_id: report.document_id.clone(),
                success: true,
                fragment_count: report.fragment_count,
                error: None,
            },
            Err(e) => Self {
                document_id: document_id.into(),
                success: false,
                fragment_count: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

/// How a question was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryStatus {
    Answered,
    EmptyKnowledgeBase,
    Unavailable,
    RetrievalFailed,
    GenerationFailed,
}

/// A retrieved fragment cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub fragment_id: String,
    pub source_document_id: String,
    pub sequence_index: usize,
    pub score: f32,
    pub text: String,
}

impl From<ScoredFragment> for SourceRef {
    fn from(hit: ScoredFragment) -> Self {
        Self {
            fragment_id: hit.id,
            source_document_id: hit.payload.source_document_id,
            sequence_index: hit.payload.sequence_index,
            score: hit.score,
            text: hit.payload.text,
        }
    }
}

/// Answer to a question. Always produced; failures are statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub status: QueryStatus,
    pub answer: String,
    /// Retrieved fragments, best match first
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl QueryResponse {
    fn without_sources(status: QueryStatus, answer: impl Into<String>) -> Self {
        Self {
            status,
            answer: answer.into(),
            sources: Vec::new(),
            model: None,
        }
    }
}

/// Snapshot of the engine for health checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub state: String,
    pub collection_name: String,
    pub collection_present: bool,
    pub fragment_count: u64,
    pub vector_store: String,
    pub embedding_model: String,
    pub embedding_dimension: Option<usize>,
    pub generation_model: String,
    pub failures: Vec<DependencyFailure>,
    pub checked_at: String,
}

/// Everything the engine needs besides its dependencies.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub collection_name: String,
    /// Expected embedding dimension; `None` accepts whatever the model produces
    pub embedding_dimension: Option<usize>,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub history: HistorySettings,
    pub prompt: PromptDefinition,
}

impl EngineSettings {
    /// Settings from the application configuration.
    ///
    /// The answer prompt comes from `.abunda/prompts/abunda.answer.yml` if
    /// the workspace defines one.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            collection_name: config.vector_store.collection_name.clone(),
            embedding_dimension: config.vector_store.embedding_dimension,
            chunking: config.chunking,
            retrieval: config.retrieval,
            generation: config.generation.clone(),
            history: config.history,
            prompt: load_prompt_or_default(
                &config.workspace,
                abunda_prompt::loader::DEFAULT_PROMPT_ID,
            )?,
        })
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        let config = AppConfig::default();
        Self {
            collection_name: config.vector_store.collection_name,
            embedding_dimension: config.vector_store.embedding_dimension,
            chunking: config.chunking,
            retrieval: config.retrieval,
            generation: config.generation,
            history: config.history,
            prompt: default_prompt(),
        }
    }
}

/// The retrieval-augmented knowledge engine.
///
/// Share it as `Arc<KnowledgeEngine>`; every method takes `&self`. Locks
/// guard only the state values and are never held across a network call.
pub struct KnowledgeEngine {
    settings: EngineSettings,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    state: RwLock<EngineState>,
    collection: RwLock<Option<Collection>>,
    dimension: RwLock<Option<usize>>,
    model: RwLock<String>,
}

impl KnowledgeEngine {
    /// Assemble an engine from explicit dependencies.
    pub fn new(
        settings: EngineSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        let chunker = Chunker::from_settings(&settings.chunking)?;
        let model = settings.generation.model.clone();

        Ok(Self {
            settings,
            chunker,
            embedder,
            store,
            llm,
            state: RwLock::new(EngineState::Uninitialized),
            collection: RwLock::new(None),
            dimension: RwLock::new(None),
            model: RwLock::new(model),
        })
    }

    /// Build the engine and its adapters from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let settings = EngineSettings::from_config(config)?;
        let embedder = embeddings::create_provider(&config.embedding)?;
        let store = store::create_store(config)?;
        let llm = create_client(&config.generation)?;

        Self::new(settings, embedder, store, llm)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn state(&self) -> EngineState {
        self.state.read().await.clone()
    }

    /// Generation model in use (resolved by `initialize`).
    pub async fn model(&self) -> String {
        self.model.read().await.clone()
    }

    /// Check every dependency and settle on `Active` or `Degraded`.
    ///
    /// May be called from any state; this is also the recovery path for a
    /// degraded engine.
    pub async fn initialize(&self) -> EngineState {
        let collection_name = &self.settings.collection_name;
        tracing::info!("Initializing knowledge engine (collection '{}')", collection_name);

        let mut failures = Vec::new();

        let (store_health, probe, llm_health) = tokio::join!(
            self.store.health_check(),
            self.embedder.probe_dimension(),
            self.llm.health_check(),
        );

        let store_ok = match store_health {
            Ok(()) => true,
            Err(e) => {
                failures.push(DependencyFailure::new(Dependency::VectorStore, &e));
                false
            }
        };

        let dimension = match probe {
            Ok(probed) => match self.settings.embedding_dimension {
                Some(expected) if expected != probed => {
                    failures.push(DependencyFailure {
                        dependency: Dependency::Configuration,
                        reason: format!(
                            "embeddingDimension is {} but model '{}' produces {}-dimensional vectors",
                            expected,
                            self.embedder.model_name(),
                            probed
                        ),
                    });
                    None
                }
                _ => Some(probed),
            },
            Err(e) => {
                failures.push(DependencyFailure::new(Dependency::Embedding, &e));
                None
            }
        };

        match llm_health {
            Ok(()) => {
                let chosen = select_model(
                    self.llm.as_ref(),
                    &self.settings.generation.preferred_models,
                    &self.settings.generation.model,
                )
                .await;
                *self.model.write().await = chosen;
            }
            Err(e) => failures.push(DependencyFailure::new(Dependency::Generation, &e)),
        }

        let mut collection = None;
        if store_ok {
            match self.store.collection_info(collection_name).await {
                Ok(Some(info)) => match dimension {
                    Some(d) if d != info.dimension => failures.push(DependencyFailure {
                        dependency: Dependency::Configuration,
                        reason: format!(
                            "collection '{}' holds {}-dimensional vectors but the embedding model produces {}",
                            collection_name, info.dimension, d
                        ),
                    }),
                    _ => collection = Some(Collection::from_info(collection_name, info)),
                },
                Ok(None) => {
                    tracing::info!("Collection '{}' does not exist yet", collection_name);
                }
                Err(e) => failures.push(DependencyFailure::new(Dependency::VectorStore, &e)),
            }
        }

        let state = if failures.is_empty() {
            EngineState::Active
        } else {
            for failure in &failures {
                tracing::warn!("Dependency check failed: {}", failure);
            }
            EngineState::Degraded { failures }
        };

        *self.dimension.write().await = dimension;
        *self.collection.write().await = collection;
        *self.state.write().await = state.clone();

        tracing::info!("Knowledge engine is {}", state);
        state
    }

    /// Drop the collection handle and return to `Uninitialized`.
    pub async fn shutdown(&self) {
        *self.collection.write().await = None;
        *self.dimension.write().await = None;
        *self.state.write().await = EngineState::Uninitialized;
        tracing::info!("Knowledge engine shut down");
    }

    /// Chunk, embed and store one document.
    ///
    /// The document is committed as a single batch: any failure fails the
    /// whole document and nothing is reported as stored.
    pub async fn ingest(&self, document: &Document) -> AppResult<IngestReport> {
        self.ensure_active().await?;

        let fragments = self.chunker.split(document);
        if fragments.is_empty() {
            return Err(AppError::Ingestion(format!(
                "no extractable text in {}",
                document.id
            )));
        }

        tracing::info!(
            "Ingesting {} ({} fragments)",
            document.id,
            fragments.len()
        );

        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        let vectors = self
            .observe(Dependency::Embedding, self.embedder.embed_batch(&texts).await)
            .await?;

        if vectors.len() != fragments.len() {
            return Err(AppError::Ingestion(format!(
                "embedding provider returned {} vectors for {} fragments",
                vectors.len(),
                fragments.len()
            )));
        }

        let fragments: Vec<Fragment> = fragments
            .into_iter()
            .zip(vectors)
            .map(|(fragment, vector)| fragment.with_embedding(vector))
            .collect();

        let dimension = match *self.dimension.read().await {
            Some(d) => d,
            None => fragments
                .first()
                .and_then(|f| f.embedding.as_ref())
                .map(Vec::len)
                .unwrap_or(0),
        };
        if let Some(fragment) = fragments
            .iter()
            .find(|f| f.embedding.as_ref().map(Vec::len) != Some(dimension))
        {
            return Err(AppError::Ingestion(format!(
                "fragment {} of {} embedded to {} dimensions, expected {}",
                fragment.sequence_index,
                document.id,
                fragment.embedding.as_ref().map(Vec::len).unwrap_or(0),
                dimension
            )));
        }

        let collection_name = self.settings.collection_name.clone();
        self.ensure_collection(dimension).await?;

        let ingested_at = Utc::now().to_rfc3339();
        let content_type = document.content_type.as_str();
        let records: Vec<VectorRecord> = fragments
            .into_iter()
            .map(|fragment| fragment.into_record(content_type, &ingested_at))
            .collect::<AppResult<_>>()?;
        let fragment_count = records.len();

        self.observe(
            Dependency::VectorStore,
            self.store.upsert(&collection_name, &records).await,
        )
        .await
        .map_err(|e| match e {
            AppError::Unavailable(_) | AppError::Timeout(_) => e,
            other => AppError::Ingestion(format!("upsert of {} failed: {}", document.id, other)),
        })?;

        self.refresh_count().await;

        tracing::info!("Ingested {} into '{}'", document.id, collection_name);

        Ok(IngestReport {
            document_id: document.id.clone(),
            fragment_count,
            collection: collection_name,
        })
    }

    /// Load a document from raw bytes and ingest it.
    pub async fn ingest_bytes(&self, bytes: &[u8], filename: &str) -> AppResult<IngestReport> {
        let document = loader::load_bytes(bytes, filename)?;
        self.ingest(&document).await
    }

    /// Answer a question from the knowledge base.
    ///
    /// Never fails: unavailability, an empty knowledge base and provider
    /// errors all come back as a [`QueryStatus`] with a readable message.
    pub async fn query(&self, question: &str, history: &[ConversationTurn]) -> QueryResponse {
        let state = self.state().await;
        if !state.is_active() {
            tracing::warn!("Query refused: engine is {}", state);
            return QueryResponse::without_sources(
                QueryStatus::Unavailable,
                offline_message(&state),
            );
        }

        let collection = self.collection.read().await.clone();
        let collection = match collection {
            Some(c) if !c.is_empty() => c,
            _ => {
                tracing::info!("Query on empty knowledge base");
                return QueryResponse::without_sources(QueryStatus::EmptyKnowledgeBase, EMPTY_MESSAGE);
            }
        };

        let hits = match self.retrieve(&collection.name, question).await {
            Ok(hits) => hits,
            Err(e) => return self.retrieval_failure(e).await,
        };

        tracing::debug!(
            "Retrieved {} fragments, scores: {:?}",
            hits.len(),
            hits.iter().map(|h| h.score).collect::<Vec<_>>()
        );

        let turns = history::recent_turns(history, self.settings.history.max_turns);
        let model = self.model().await;

        match self.generate(question, &hits, &turns, &model).await {
            Ok(answer) => QueryResponse {
                status: QueryStatus::Answered,
                answer,
                sources: hits.into_iter().map(SourceRef::from).collect(),
                model: Some(model),
            },
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                let (status, answer) = if e.is_unavailable() {
                    let state = self.state().await;
                    (QueryStatus::Unavailable, offline_message(&state))
                } else {
                    (QueryStatus::GenerationFailed, GENERATION_FAILED_MESSAGE.to_string())
                };
                QueryResponse {
                    status,
                    answer,
                    sources: hits.into_iter().map(SourceRef::from).collect(),
                    model: Some(model),
                }
            }
        }
    }

    /// Current state, collection and models, without touching the network.
    pub async fn health_status(&self) -> HealthReport {
        let state = self.state().await;
        let collection = self.collection.read().await.clone();

        HealthReport {
            state: state.name().to_string(),
            collection_name: self.settings.collection_name.clone(),
            collection_present: collection.is_some(),
            fragment_count: collection.map(|c| c.fragment_count).unwrap_or(0),
            vector_store: self.store.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            embedding_dimension: *self.dimension.read().await,
            generation_model: self.model().await,
            failures: state.failures().to_vec(),
            checked_at: Utc::now().to_rfc3339(),
        }
    }

    /// Delete the collection and everything in it.
    pub async fn reset(&self) -> AppResult<bool> {
        self.ensure_active().await?;

        let name = &self.settings.collection_name;
        let existed = self
            .observe(Dependency::VectorStore, self.store.delete_collection(name).await)
            .await?;
        *self.collection.write().await = None;

        tracing::info!("Reset collection '{}' (existed: {})", name, existed);
        Ok(existed)
    }

    async fn ensure_active(&self) -> AppResult<()> {
        match self.state().await {
            EngineState::Active => Ok(()),
            EngineState::Uninitialized => Err(AppError::Unavailable(
                "knowledge engine is not initialized".to_string(),
            )),
            EngineState::Degraded { failures } => Err(AppError::Unavailable(format!(
                "knowledge engine is degraded ({})",
                join_failures(&failures)
            ))),
        }
    }

    /// Create the collection on first use and cache its handle.
    async fn ensure_collection(&self, dimension: usize) -> AppResult<()> {
        if let Some(existing) = self.collection.read().await.as_ref() {
            if existing.dimension != dimension {
                return Err(AppError::Ingestion(format!(
                    "collection '{}' holds {}-dimensional vectors, refusing {}-dimensional fragments",
                    existing.name, existing.dimension, dimension
                )));
            }
            return Ok(());
        }

        let name = &self.settings.collection_name;
        let info = self
            .observe(
                Dependency::VectorStore,
                self.store.ensure_collection(name, dimension).await,
            )
            .await?;

        *self.collection.write().await = Some(Collection::from_info(name, info));
        *self.dimension.write().await = Some(dimension);
        Ok(())
    }

    async fn refresh_count(&self) {
        let name = &self.settings.collection_name;
        match self.store.collection_info(name).await {
            Ok(Some(info)) => {
                *self.collection.write().await = Some(Collection::from_info(name, info));
            }
            Ok(None) => {
                tracing::warn!("Collection '{}' vanished after upsert", name);
                *self.collection.write().await = None;
            }
            Err(e) => {
                tracing::warn!("Could not refresh fragment count: {}", e);
                let _ = self.observe::<()>(Dependency::VectorStore, Err(e)).await;
            }
        }
    }

    async fn retrieve(&self, collection: &str, question: &str) -> AppResult<Vec<ScoredFragment>> {
        let vector = self
            .observe(Dependency::Embedding, self.embedder.embed(question).await)
            .await?;

        let hits = self
            .observe(
                Dependency::VectorStore,
                self.store
                    .search(collection, &vector, self.settings.retrieval.top_k)
                    .await,
            )
            .await?;

        let min_score = self.settings.retrieval.min_score;
        Ok(hits.into_iter().filter(|h| h.score >= min_score).collect())
    }

    async fn retrieval_failure(&self, error: AppError) -> QueryResponse {
        tracing::error!("Retrieval failed: {}", error);

        if error.is_unavailable() {
            let state = self.state().await;
            QueryResponse::without_sources(QueryStatus::Unavailable, offline_message(&state))
        } else {
            QueryResponse::without_sources(QueryStatus::RetrievalFailed, RETRIEVAL_FAILED_MESSAGE)
        }
    }

    async fn generate(
        &self,
        question: &str,
        hits: &[ScoredFragment],
        turns: &[ConversationTurn],
        model: &str,
    ) -> AppResult<String> {
        let generation = &self.settings.generation;
        let chat_mode = generation.mode == GenerationMode::Chat;

        let context = PromptContext {
            question: question.to_string(),
            fragments: hits
                .iter()
                .map(|h| ContextFragment {
                    source: h.payload.source_document_id.clone(),
                    sequence: h.payload.sequence_index,
                    text: h.payload.text.clone(),
                })
                .collect(),
            // Chat mode replays history as messages instead
            history: if chat_mode {
                Vec::new()
            } else {
                history::to_prompt_lines(turns)
            },
        };

        let prompt = build_prompt(
            &self.settings.prompt,
            &context,
            Some(generation.system_instruction.as_str()),
        )?;
        let options = GenerationOptions::from(generation);

        let result = if chat_mode {
            let mut session = ChatSession::start(
                self.llm.clone(),
                model,
                prompt.system,
                history::to_chat_messages(turns),
                options,
            );
            session.send(prompt.user).await
        } else {
            let mut request = LlmRequest::new(prompt.user, model).with_options(options);
            if let Some(system) = prompt.system {
                request = request.with_system(system);
            }
            self.llm.complete(&request).await.map(|r| r.content)
        };

        let answer = self.observe(Dependency::Generation, result).await?;
        if answer.trim().is_empty() {
            return Err(AppError::Generation(
                "provider returned an empty answer".to_string(),
            ));
        }

        Ok(answer)
    }

    /// Pass a result through, degrading the engine on a lost connection.
    async fn observe<T>(&self, dependency: Dependency, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            if e.is_unavailable() {
                self.degrade(DependencyFailure::new(dependency, e)).await;
            } else if e.is_timeout() {
                tracing::warn!("{} timed out: {}", dependency, e);
            }
        }
        result
    }

    async fn degrade(&self, failure: DependencyFailure) {
        let mut state = self.state.write().await;
        tracing::warn!("Lost connection to {}; engine degraded", failure);

        match &mut *state {
            EngineState::Degraded { failures } => {
                if !failures.iter().any(|f| f.dependency == failure.dependency) {
                    failures.push(failure);
                }
            }
            _ => {
                *state = EngineState::Degraded {
                    failures: vec![failure],
                }
            }
        }
    }
}

fn join_failures(failures: &[DependencyFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn offline_message(state: &EngineState) -> String {
    match state {
        EngineState::Degraded { failures } if !failures.is_empty() => {
            let names: Vec<String> = failures.iter().map(|f| f.dependency.to_string()).collect();
            format!(
                "{}: the {} cannot be reached. Please try again later.",
                OFFLINE_MESSAGE,
                names.join(" and ")
            )
        }
        EngineState::Uninitialized => {
            format!("{}: the engine has not been started.", OFFLINE_MESSAGE)
        }
        _ => format!("{}. Please try again later.", OFFLINE_MESSAGE),
    }
}
