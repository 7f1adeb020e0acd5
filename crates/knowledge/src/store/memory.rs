//! Process-local vector store.

use super::{check_dimension, rank_by_similarity, VectorStore};
use crate::types::{CollectionInfo, ScoredFragment, VectorRecord};
use abunda_core::{AppError, AppResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryCollection {
    dimension: usize,
    records: BTreeMap<String, VectorRecord>,
}

/// Vector store kept in memory; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VectorStore for MemoryStore {
    fn provider_name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections.get(collection).map(|c| CollectionInfo {
            dimension: c.dimension,
            fragment_count: c.records.len() as u64,
        }))
    }

    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> AppResult<CollectionInfo> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(|| MemoryCollection {
                dimension,
                records: BTreeMap::new(),
            });

        check_dimension(collection, entry.dimension, dimension)?;

        Ok(CollectionInfo {
            dimension: entry.dimension,
            fragment_count: entry.records.len() as u64,
        })
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> AppResult<()> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let target = collections.get_mut(collection).ok_or_else(|| {
            AppError::VectorStore(format!("Collection '{}' does not exist", collection))
        })?;

        if let Some(bad) = records.iter().find(|r| r.vector.len() != target.dimension) {
            return Err(AppError::VectorStore(format!(
                "Vector for {} has {} dimensions, collection expects {}",
                bad.id,
                bad.vector.len(),
                target.dimension
            )));
        }

        for record in records {
            target.records.insert(record.id.clone(), record.clone());
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> AppResult<Vec<ScoredFragment>> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(match collections.get(collection) {
            Some(c) => rank_by_similarity(query, c.records.values().cloned(), k),
            None => Vec::new(),
        })
    }

    async fn delete_collection(&self, collection: &str) -> AppResult<bool> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        Ok(collections.remove(collection).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::record;

    #[tokio::test]
    async fn test_missing_collection_is_distinct_from_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.collection_info("kb").await.unwrap(), None);
        assert!(store.search("kb", &[1.0, 0.0], 3).await.unwrap().is_empty());

        store.ensure_collection("kb", 2).await.unwrap();
        assert_eq!(
            store.collection_info("kb").await.unwrap(),
            Some(CollectionInfo {
                dimension: 2,
                fragment_count: 0
            })
        );
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        store.ensure_collection("kb", 2).await.unwrap();

        let batch = vec![
            record("a", "doc", 0, vec![1.0, 0.0]),
            record("b", "doc", 1, vec![0.0, 1.0]),
        ];
        store.upsert("kb", &batch).await.unwrap();
        store.upsert("kb", &batch).await.unwrap();

        assert_eq!(store.count("kb").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dimension_guard() {
        let store = MemoryStore::new();
        store.ensure_collection("kb", 2).await.unwrap();

        assert!(matches!(
            store.ensure_collection("kb", 3).await,
            Err(AppError::Config(_))
        ));
        assert!(store
            .upsert("kb", &[record("a", "doc", 0, vec![1.0, 0.0, 0.0])])
            .await
            .is_err());
        assert_eq!(store.count("kb").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let store = MemoryStore::new();
        store.ensure_collection("kb", 2).await.unwrap();
        store
            .upsert(
                "kb",
                &[
                    record("a", "doc", 0, vec![1.0, 0.0]),
                    record("b", "doc", 1, vec![0.6, 0.8]),
                ],
            )
            .await
            .unwrap();

        let hits = store.search("kb", &[0.6, 0.8], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b");
        assert!(hits[0].score >= hits[1].score);

        assert!(store.delete_collection("kb").await.unwrap());
        assert!(!store.delete_collection("kb").await.unwrap());
        assert!(!store.collection_exists("kb").await.unwrap());
    }
}
