//! Fakes and fixtures shared by the engine tests.

use crate::embeddings::{EmbeddingProvider, TrigramProvider};
use crate::engine::{EngineSettings, EngineState, KnowledgeEngine};
use crate::store::{MemoryStore, VectorStore};
use crate::types::{CollectionInfo, ScoredFragment, VectorRecord};
use abunda_core::config::ChunkingSettings;
use abunda_core::{AppError, AppResult};
use abunda_llm::{ChatRequest, EchoClient, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub const DIMENSIONS: usize = 256;
pub const COLLECTION: &str = "kb";

/// Two short paragraphs that chunk into exactly two fragments.
pub const HANDBOOK: &str =
    "Employees receive 25 vacation days per year.\n\nThe parking garage closes at midnight.";

/// Six paragraphs with no shared vocabulary.
pub const POLICIES: &str = "Vacation requests go through the HR portal.\n\n\
Expense reports are due within thirty days.\n\n\
Laptops are replaced every three years.\n\n\
Visitors must sign in at the front desk.\n\n\
Payroll runs on the last Friday of each month.\n\n\
Security badges must be worn at all times.";

/// Connection state of a fake dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Up,
    Down,
    Slow,
}

#[derive(Debug, Default)]
struct LinkSwitch(AtomicU8);

impl LinkSwitch {
    fn set(&self, link: Link) {
        let value = match link {
            Link::Up => 0,
            Link::Down => 1,
            Link::Slow => 2,
        };
        self.0.store(value, Ordering::SeqCst);
    }

    fn check(&self, name: &str) -> AppResult<()> {
        match self.0.load(Ordering::SeqCst) {
            0 => Ok(()),
            1 => Err(AppError::Unavailable(format!("{}: connection refused", name))),
            _ => Err(AppError::Timeout(format!("{}: no answer", name))),
        }
    }
}

/// In-memory store that can be taken offline or made to time out.
pub struct SwitchableStore {
    inner: MemoryStore,
    link: LinkSwitch,
}

impl SwitchableStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            link: LinkSwitch::default(),
        }
    }

    pub fn set(&self, link: Link) {
        self.link.set(link);
    }

    /// The backing store, bypassing the switch.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait::async_trait]
impl VectorStore for SwitchableStore {
    fn provider_name(&self) -> &str {
        "switchable"
    }

    async fn health_check(&self) -> AppResult<()> {
        self.link.check("store")?;
        self.inner.health_check().await
    }

    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>> {
        self.link.check("store")?;
        self.inner.collection_info(collection).await
    }

    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> AppResult<CollectionInfo> {
        self.link.check("store")?;
        self.inner.ensure_collection(collection, dimension).await
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> AppResult<()> {
        self.link.check("store")?;
        self.inner.upsert(collection, records).await
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> AppResult<Vec<ScoredFragment>> {
        self.link.check("store")?;
        self.inner.search(collection, query, k).await
    }

    async fn delete_collection(&self, collection: &str) -> AppResult<bool> {
        self.link.check("store")?;
        self.inner.delete_collection(collection).await
    }
}

/// Trigram embedder behind a switch.
#[derive(Debug)]
pub struct SwitchableEmbedder {
    inner: TrigramProvider,
    link: LinkSwitch,
}

impl SwitchableEmbedder {
    pub fn new() -> Self {
        Self {
            inner: TrigramProvider::new(DIMENSIONS),
            link: LinkSwitch::default(),
        }
    }

    pub fn set(&self, link: Link) {
        self.link.set(link);
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    fn provider_name(&self) -> &str {
        "switchable"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.link.check("embedder")?;
        self.inner.embed_batch(texts).await
    }
}

/// A model server that is reachable but answers badly.
pub struct BrokenModel {
    /// `None` fails every generation call; `Some` replies with the text
    pub reply: Option<String>,
}

#[async_trait::async_trait]
impl LlmClient for BrokenModel {
    fn provider_name(&self) -> &str {
        "broken"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        match &self.reply {
            Some(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
                done: true,
            }),
            None => Err(AppError::Llm("model returned malformed JSON".to_string())),
        }
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<LlmResponse> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.complete(&LlmRequest::new(prompt, request.model.clone()))
            .await
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        Ok(vec!["broken".to_string()])
    }
}

pub fn settings() -> EngineSettings {
    let mut settings = EngineSettings::default();
    settings.collection_name = COLLECTION.to_string();
    settings.chunking = ChunkingSettings {
        chunk_size: 50,
        chunk_overlap: 0,
    };
    settings.generation.model = "echo".to_string();
    settings
}

pub struct Harness {
    pub engine: Arc<KnowledgeEngine>,
    pub store: Arc<SwitchableStore>,
    pub embedder: Arc<SwitchableEmbedder>,
    pub llm: Arc<EchoClient>,
}

pub fn harness_with(settings: EngineSettings, llm: EchoClient) -> Harness {
    let store = Arc::new(SwitchableStore::new());
    let embedder = Arc::new(SwitchableEmbedder::new());
    let llm = Arc::new(llm);

    let engine = KnowledgeEngine::new(settings, embedder.clone(), store.clone(), llm.clone())
        .expect("valid test settings");

    Harness {
        engine: Arc::new(engine),
        store,
        embedder,
        llm,
    }
}

pub fn harness() -> Harness {
    harness_with(settings(), EchoClient::new())
}

/// A harness whose engine is already `Active`.
pub async fn active_harness() -> Harness {
    active_harness_with(settings()).await
}

pub async fn active_harness_with(settings: EngineSettings) -> Harness {
    let harness = harness_with(settings, EchoClient::new());
    let state = harness.engine.initialize().await;
    assert_eq!(state, EngineState::Active);
    harness
}
