//! SQLite-backed vector store.
//!
//! Vectors are stored as little-endian `f32` blobs and searched by brute
//! force, which is plenty for a single-tenant knowledge base.

use super::{check_dimension, rank_by_similarity, VectorStore};
use crate::types::{CollectionInfo, FragmentPayload, ScoredFragment, VectorRecord};
use abunda_core::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Vector store in a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and its tables.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::VectorStore(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::VectorStore(format!("Failed to open SQLite store: {}", e)))?;

        Self::init(conn, db_path)
    }

    /// An in-memory database, for tests and throwaway sessions.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::VectorStore(format!("Failed to open SQLite store: {}", e)))?;

        Self::init(conn, Path::new(":memory:"))
    }

    fn init(conn: Connection, db_path: &Path) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fragments (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                source_document_id TEXT NOT NULL,
                sequence_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                content_type TEXT NOT NULL,
                ingested_at TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id),
                FOREIGN KEY (collection) REFERENCES collections(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_fragments_source
                ON fragments(collection, source_document_id);
            "#,
        )
        .map_err(|e| AppError::VectorStore(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Initialized SQLite store at {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load_records(conn: &Connection, collection: &str) -> AppResult<Vec<VectorRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, source_document_id, sequence_index, text, content_type, ingested_at, embedding
                 FROM fragments WHERE collection = ?1",
            )
            .map_err(|e| AppError::VectorStore(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection], |row| {
                let embedding_bytes: Vec<u8> = row.get(6)?;
                Ok((
                    VectorRecord {
                        id: row.get(0)?,
                        vector: Vec::new(),
                        payload: FragmentPayload {
                            source_document_id: row.get(1)?,
                            sequence_index: row.get::<_, i64>(2)? as usize,
                            text: row.get(3)?,
                            content_type: row.get(4)?,
                            ingested_at: row.get(5)?,
                        },
                    },
                    embedding_bytes,
                ))
            })
            .map_err(|e| AppError::VectorStore(format!("Failed to query fragments: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, bytes) =
                row.map_err(|e| AppError::VectorStore(format!("Failed to read fragment: {}", e)))?;
            record.vector = bytes_to_embedding(&bytes)?;
            records.push(record);
        }

        Ok(records)
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteStore {
    fn provider_name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> AppResult<()> {
        self.lock()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| AppError::VectorStore(format!("SQLite store is not usable: {}", e)))
    }

    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>> {
        let conn = self.lock();

        let dimension: Option<i64> = conn
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::VectorStore(format!("Failed to read collection: {}", e)))?;

        let Some(dimension) = dimension else {
            return Ok(None);
        };

        let fragment_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM fragments WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|e| AppError::VectorStore(format!("Failed to count fragments: {}", e)))?;

        Ok(Some(CollectionInfo {
            dimension: dimension as usize,
            fragment_count: fragment_count as u64,
        }))
    }

    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> AppResult<CollectionInfo> {
        if let Some(info) = self.collection_info(collection).await? {
            check_dimension(collection, info.dimension, dimension)?;
            return Ok(info);
        }

        self.lock()
            .execute(
                "INSERT OR IGNORE INTO collections (name, dimension, created_at) VALUES (?1, ?2, ?3)",
                params![collection, dimension as i64, Utc::now().to_rfc3339()],
            )
            .map_err(|e| AppError::VectorStore(format!("Failed to create collection: {}", e)))?;

        tracing::info!("Created collection '{}' ({} dimensions)", collection, dimension);

        Ok(CollectionInfo {
            dimension,
            fragment_count: 0,
        })
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> AppResult<()> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .map_err(|e| AppError::VectorStore(format!("Failed to begin transaction: {}", e)))?;

        let dimension: i64 = tx
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::VectorStore(format!("Failed to read collection: {}", e)))?
            .ok_or_else(|| {
                AppError::VectorStore(format!("Collection '{}' does not exist", collection))
            })?;

        for record in records {
            if record.vector.len() != dimension as usize {
                return Err(AppError::VectorStore(format!(
                    "Vector for {} has {} dimensions, collection expects {}",
                    record.id,
                    record.vector.len(),
                    dimension
                )));
            }

            tx.execute(
                "INSERT OR REPLACE INTO fragments
                 (collection, id, source_document_id, sequence_index, text, content_type, ingested_at, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    collection,
                    record.id,
                    record.payload.source_document_id,
                    record.payload.sequence_index as i64,
                    record.payload.text,
                    record.payload.content_type,
                    record.payload.ingested_at,
                    embedding_to_bytes(&record.vector),
                ],
            )
            .map_err(|e| AppError::VectorStore(format!("Failed to insert fragment: {}", e)))?;
        }

        // Dropping the transaction without commit rolls back the batch
        tx.commit()
            .map_err(|e| AppError::VectorStore(format!("Failed to commit fragments: {}", e)))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> AppResult<Vec<ScoredFragment>> {
        let records = Self::load_records(&self.lock(), collection)?;
        let results = rank_by_similarity(query, records, k);

        tracing::debug!(
            "Retrieved {} fragments (requested top-{})",
            results.len(),
            k
        );

        Ok(results)
    }

    async fn delete_collection(&self, collection: &str) -> AppResult<bool> {
        let conn = self.lock();

        conn.execute(
            "DELETE FROM fragments WHERE collection = ?1",
            params![collection],
        )
        .map_err(|e| AppError::VectorStore(format!("Failed to delete fragments: {}", e)))?;

        let removed = conn
            .execute("DELETE FROM collections WHERE name = ?1", params![collection])
            .map_err(|e| AppError::VectorStore(format!("Failed to delete collection: {}", e)))?;

        tracing::info!("Deleted collection '{}'", collection);
        Ok(removed > 0)
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::VectorStore(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::record;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_insert_and_query() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_collection("kb", 3).await.unwrap();
        store
            .upsert("kb", &[record("chunk1", "source1", 0, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let results = store.search("kb", &[1.0, 0.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "chunk1");
        assert_eq!(results[0].payload.source_document_id, "source1");
        assert!((results[0].score - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".abunda/knowledge.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.ensure_collection("kb", 2).await.unwrap();
            store
                .upsert(
                    "kb",
                    &[
                        record("a", "handbook.md", 0, vec![1.0, 0.0]),
                        record("b", "handbook.md", 1, vec![0.0, 1.0]),
                    ],
                )
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.collection_info("kb").await.unwrap(),
            Some(CollectionInfo {
                dimension: 2,
                fragment_count: 2
            })
        );
        let hits = reopened.search("kb", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn test_bad_vector_rolls_back_batch() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_collection("kb", 2).await.unwrap();

        let batch = vec![
            record("a", "doc", 0, vec![1.0, 0.0]),
            record("b", "doc", 1, vec![1.0, 0.0, 0.0]),
        ];
        assert!(store.upsert("kb", &batch).await.is_err());
        assert_eq!(store.count("kb").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.collection_info("kb").await.unwrap(), None);
        assert!(store.search("kb", &[1.0], 3).await.unwrap().is_empty());
        assert!(store.upsert("kb", &[record("a", "d", 0, vec![1.0])]).await.is_err());
        assert!(!store.delete_collection("kb").await.unwrap());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_on_existing_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_collection("kb", 4).await.unwrap();
        assert!(matches!(
            store.ensure_collection("kb", 8).await,
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_embedding_bytes_roundtrip_rejects_torn_blob() {
        assert!(bytes_to_embedding(&[0, 0, 0]).is_err());
    }
}
