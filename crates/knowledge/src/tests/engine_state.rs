//! State machine: initialization, degradation and recovery.

use super::support::*;
use crate::engine::{Dependency, EngineState, KnowledgeEngine, QueryStatus};
use crate::loader::{ContentType, Document};
use crate::store::VectorStore;
use abunda_core::AppConfig;
use abunda_llm::EchoClient;
use tempfile::TempDir;

fn handbook() -> Document {
    Document::new("handbook.md", ContentType::Markdown, HANDBOOK)
}

#[tokio::test]
async fn test_new_engine_is_uninitialized() {
    let h = harness();
    assert_eq!(h.engine.state().await, EngineState::Uninitialized);

    let response = h.engine.query("Anyone there?", &[]).await;
    assert_eq!(response.status, QueryStatus::Unavailable);
    assert!(response.answer.contains("not been started"));

    let err = h.engine.ingest(&handbook()).await.unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(h.llm.call_count(), 0);
}

#[tokio::test]
async fn test_initialize_all_reachable_is_active() {
    let h = harness();
    assert_eq!(h.engine.initialize().await, EngineState::Active);

    let report = h.engine.health_status().await;
    assert_eq!(report.state, "active");
    assert_eq!(report.collection_name, COLLECTION);
    assert!(!report.collection_present);
    assert_eq!(report.embedding_dimension, Some(DIMENSIONS));
    assert_eq!(report.generation_model, "echo");
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_store_unreachable_at_initialize_degrades() {
    let h = harness();
    h.store.set(Link::Down);

    let state = h.engine.initialize().await;
    let failures = state.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].dependency, Dependency::VectorStore);

    let report = h.engine.health_status().await;
    assert_eq!(report.state, "degraded");
    assert_eq!(report.failures[0].dependency, Dependency::VectorStore);

    let err = h.engine.ingest(&handbook()).await.unwrap_err();
    assert!(err.is_unavailable(), "got {:?}", err);
}

#[tokio::test]
async fn test_degraded_query_is_unavailable_without_generation() {
    let h = harness();
    h.store.set(Link::Down);
    h.engine.initialize().await;

    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::Unavailable);
    assert!(response.answer.contains("vector store"), "{}", response.answer);
    assert!(response.sources.is_empty());
    assert_eq!(h.llm.call_count(), 0);
}

#[tokio::test]
async fn test_generation_offline_degrades() {
    let h = harness_with(settings(), EchoClient::new().failing());

    let state = h.engine.initialize().await;
    assert_eq!(state.failures()[0].dependency, Dependency::Generation);
}

#[tokio::test]
async fn test_every_unreachable_dependency_is_named() {
    let h = harness_with(settings(), EchoClient::new().failing());
    h.store.set(Link::Down);
    h.embedder.set(Link::Down);

    let state = h.engine.initialize().await;
    let mut named: Vec<Dependency> = state.failures().iter().map(|f| f.dependency).collect();
    named.sort_by_key(|d| d.to_string());
    assert_eq!(
        named,
        vec![
            Dependency::Embedding,
            Dependency::Generation,
            Dependency::VectorStore
        ]
    );
}

#[tokio::test]
async fn test_configured_dimension_mismatch_degrades() {
    let mut settings = settings();
    settings.embedding_dimension = Some(768);
    let h = harness_with(settings, EchoClient::new());

    let state = h.engine.initialize().await;
    assert_eq!(state.failures().len(), 1);
    assert_eq!(state.failures()[0].dependency, Dependency::Configuration);
    assert!(state.failures()[0].reason.contains("768"));
}

#[tokio::test]
async fn test_existing_collection_dimension_mismatch_degrades() {
    let h = harness();
    h.store.inner().ensure_collection(COLLECTION, 16).await.unwrap();

    let state = h.engine.initialize().await;
    assert_eq!(state.failures()[0].dependency, Dependency::Configuration);
}

#[tokio::test]
async fn test_existing_empty_collection_is_loaded() {
    let h = harness();
    h.store
        .inner()
        .ensure_collection(COLLECTION, DIMENSIONS)
        .await
        .unwrap();

    assert_eq!(h.engine.initialize().await, EngineState::Active);
    let report = h.engine.health_status().await;
    assert!(report.collection_present);
    assert_eq!(report.fragment_count, 0);

    let response = h.engine.query("Anything?", &[]).await;
    assert_eq!(response.status, QueryStatus::EmptyKnowledgeBase);
}

#[tokio::test]
async fn test_store_drop_while_active_degrades_and_recovers() {
    let h = active_harness().await;
    h.engine.ingest(&handbook()).await.unwrap();

    h.store.set(Link::Down);
    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::Unavailable);

    let state = h.engine.state().await;
    assert_eq!(state.failures()[0].dependency, Dependency::VectorStore);
    assert_eq!(h.llm.call_count(), 0);

    // Still degraded once the store is back, until re-initialized
    h.store.set(Link::Up);
    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::Unavailable);

    assert_eq!(h.engine.initialize().await, EngineState::Active);
    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::Answered);
}

#[tokio::test]
async fn test_embedder_drop_during_ingest_degrades() {
    let h = active_harness().await;
    h.embedder.set(Link::Down);

    let err = h.engine.ingest(&handbook()).await.unwrap_err();
    assert!(err.is_unavailable());

    let state = h.engine.state().await;
    assert_eq!(state.failures()[0].dependency, Dependency::Embedding);
}

#[tokio::test]
async fn test_timeouts_do_not_change_state() {
    let h = active_harness().await;
    h.engine.ingest(&handbook()).await.unwrap();

    h.store.set(Link::Slow);
    let err = h.engine.ingest(&handbook()).await.unwrap_err();
    assert!(err.is_timeout(), "got {:?}", err);
    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::RetrievalFailed);
    assert_eq!(h.engine.state().await, EngineState::Active);

    h.store.set(Link::Up);
    h.embedder.set(Link::Slow);
    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::RetrievalFailed);
    assert_eq!(h.engine.state().await, EngineState::Active);

    h.embedder.set(Link::Up);
    let response = h.engine.query("How many vacation days?", &[]).await;
    assert_eq!(response.status, QueryStatus::Answered);
}

#[tokio::test]
async fn test_shutdown_returns_to_uninitialized() {
    let h = active_harness().await;
    h.engine.ingest(&handbook()).await.unwrap();

    h.engine.shutdown().await;
    assert_eq!(h.engine.state().await, EngineState::Uninitialized);
    assert!(!h.engine.health_status().await.collection_present);

    // Data survives in the store and is found again
    h.engine.initialize().await;
    assert_eq!(h.engine.health_status().await.fragment_count, 2);
}

#[tokio::test]
async fn test_from_config_with_offline_providers() {
    let temp = TempDir::new().unwrap();
    let mut config = AppConfig {
        workspace: temp.path().to_path_buf(),
        ..Default::default()
    };
    config.vector_store.provider = "sqlite".to_string();
    config.embedding.provider = "trigram".to_string();
    config.embedding.dimensions = 64;
    config.generation.provider = "echo".to_string();
    config.generation.model = "echo".to_string();

    let engine = KnowledgeEngine::from_config(&config).unwrap();
    assert_eq!(engine.initialize().await, EngineState::Active);

    let report = engine
        .ingest(&Document::new("handbook.md", ContentType::Markdown, HANDBOOK))
        .await
        .unwrap();
    assert_eq!(report.collection, "abunda_knowledge_base");
    assert!(config.sqlite_path().exists());
}

#[tokio::test]
async fn test_from_config_rejects_invalid_settings() {
    let mut config = AppConfig::default();
    config.generation.provider = "echo".to_string();
    config.chunking.chunk_overlap = config.chunking.chunk_size;

    let err = KnowledgeEngine::from_config(&config).err().unwrap();
    assert!(matches!(err, abunda_core::AppError::Config(_)));
}
