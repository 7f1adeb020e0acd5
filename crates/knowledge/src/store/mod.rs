//! Vector store adapters.
//!
//! Every adapter stores fragment vectors with their payload in a named
//! collection and answers cosine top-k queries. Searching a collection
//! that does not exist is not an error; it simply finds nothing.

pub mod memory;
pub mod qdrant;
pub mod sqlite;

pub use memory::MemoryStore;
pub use qdrant::QdrantStore;
pub use sqlite::SqliteStore;

use crate::types::{CollectionInfo, ScoredFragment, VectorRecord};
use abunda_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Persistent vector memory.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name (e.g., "qdrant", "sqlite", "memory")
    fn provider_name(&self) -> &str;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<()>;

    /// Dimension and size of a collection, or `None` if it does not exist.
    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>>;

    async fn collection_exists(&self, collection: &str) -> AppResult<bool> {
        Ok(self.collection_info(collection).await?.is_some())
    }

    /// Create the collection if needed.
    ///
    /// # Errors
    /// `AppError::Config` if it exists with a different dimension.
    async fn ensure_collection(&self, collection: &str, dimension: usize)
        -> AppResult<CollectionInfo>;

    /// Insert or replace records by id.
    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> AppResult<()>;

    /// Up to `k` nearest records, best first.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> AppResult<Vec<ScoredFragment>>;

    /// Number of stored records; zero for a missing collection.
    async fn count(&self, collection: &str) -> AppResult<u64> {
        Ok(self
            .collection_info(collection)
            .await?
            .map(|info| info.fragment_count)
            .unwrap_or(0))
    }

    /// Drop a collection. Returns whether it existed.
    async fn delete_collection(&self, collection: &str) -> AppResult<bool>;
}

/// Create the vector store named by the `vectorStore` configuration section.
pub fn create_store(config: &AppConfig) -> AppResult<Arc<dyn VectorStore>> {
    let settings = &config.vector_store;

    match settings.provider.to_lowercase().as_str() {
        "qdrant" => Ok(Arc::new(QdrantStore::new(
            &settings.endpoint,
            Duration::from_secs(settings.timeout_secs),
        )?)),
        "sqlite" => {
            let path = config.sqlite_path();
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(AppError::Config(format!(
            "Unknown vector store provider: '{}'. Supported providers: qdrant, sqlite, memory",
            other
        ))),
    }
}

/// Reject a dimension change on an existing collection.
pub(crate) fn check_dimension(
    collection: &str,
    existing: usize,
    requested: usize,
) -> AppResult<()> {
    if existing != requested {
        return Err(AppError::Config(format!(
            "Collection '{}' stores {}-dimensional vectors but the embedding model produces {}",
            collection, existing, requested
        )));
    }
    Ok(())
}

/// Rank candidates by cosine similarity and keep the best `k`.
pub(crate) fn rank_by_similarity<I>(query: &[f32], candidates: I, k: usize) -> Vec<ScoredFragment>
where
    I: IntoIterator<Item = VectorRecord>,
{
    let mut scored: Vec<ScoredFragment> = candidates
        .into_iter()
        .map(|record| ScoredFragment {
            score: crate::types::cosine_similarity(query, &record.vector),
            id: record.id,
            payload: record.payload,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_store_by_provider() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };

        config.vector_store.provider = "memory".to_string();
        assert_eq!(create_store(&config).unwrap().provider_name(), "memory");

        config.vector_store.provider = "sqlite".to_string();
        assert_eq!(create_store(&config).unwrap().provider_name(), "sqlite");
        assert!(config.sqlite_path().exists());

        config.vector_store.provider = "qdrant".to_string();
        assert_eq!(create_store(&config).unwrap().provider_name(), "qdrant");

        config.vector_store.provider = "pinecone".to_string();
        assert!(matches!(create_store(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rank_by_similarity() {
        let candidates = vec![
            test_support::record("a", "doc", 0, vec![0.0, 1.0]),
            test_support::record("b", "doc", 1, vec![1.0, 0.0]),
            test_support::record("c", "doc", 2, vec![0.7, 0.7]),
        ];

        let ranked = rank_by_similarity(&[1.0, 0.0], candidates, 2);
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
