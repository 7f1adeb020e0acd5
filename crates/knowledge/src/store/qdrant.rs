//! Qdrant vector store over its REST API.
//!
//! Qdrant API: https://api.qdrant.tech/api-reference

use super::{check_dimension, VectorStore};
use crate::types::{CollectionInfo, FragmentPayload, ScoredFragment, VectorRecord};
use abunda_core::{AppError, AppResult};
use abunda_llm::transport_error;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Qdrant client for a single server.
pub struct QdrantStore {
    base_url: String,
    client: Client,
}

/// Qdrant wraps every answer in `{"result": ..., "status": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    #[serde(default)]
    points_count: Option<u64>,
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Debug, Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct UpsertPoints<'a> {
    points: Vec<Point<'a>>,
}

#[derive(Debug, Serialize)]
struct Point<'a> {
    id: &'a str,
    vector: &'a [f32],
    payload: &'a FragmentPayload,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: serde_json::Value,
    score: f32,
    payload: Option<FragmentPayload>,
}

impl QdrantStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::VectorStore(format!("Failed to create HTTP client for Qdrant: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<Response> {
        request
            .send()
            .await
            .map_err(|e| transport_error("Qdrant", e, AppError::VectorStore))
    }

    /// Turn a non-success response into an error.
    async fn check(response: Response, action: &str) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(AppError::VectorStore(format!(
            "Qdrant failed to {} ({}): {}",
            action, status, error_text
        )))
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> AppResult<T> {
        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.result)
            .map_err(|e| AppError::VectorStore(format!("Failed to parse Qdrant response: {}", e)))
    }
}

#[async_trait::async_trait]
impl VectorStore for QdrantStore {
    fn provider_name(&self) -> &str {
        "qdrant"
    }

    #[instrument(skip(self), fields(url = %self.base_url))]
    async fn health_check(&self) -> AppResult<()> {
        let response = self.send(self.client.get(self.url("/collections"))).await?;
        Self::check(response, "list collections").await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>> {
        let response = self
            .send(self.client.get(self.url(&format!("/collections/{}", collection))))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let description: CollectionDescription =
            Self::parse(Self::check(response, "describe collection").await?).await?;

        Ok(Some(CollectionInfo {
            dimension: description.config.params.vectors.size,
            fragment_count: description.points_count.unwrap_or(0),
        }))
    }

    #[instrument(skip(self))]
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> AppResult<CollectionInfo> {
        if let Some(info) = self.collection_info(collection).await? {
            check_dimension(collection, info.dimension, dimension)?;
            return Ok(info);
        }

        let body = CreateCollection {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine".to_string(),
            },
        };
        let response = self
            .send(
                self.client
                    .put(self.url(&format!("/collections/{}", collection)))
                    .json(&body),
            )
            .await?;
        Self::check(response, "create collection").await?;

        tracing::info!("Created Qdrant collection '{}' ({} dimensions)", collection, dimension);

        Ok(CollectionInfo {
            dimension,
            fragment_count: 0,
        })
    }

    #[instrument(skip(self, records), fields(records = records.len()))]
    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let body = UpsertPoints {
            points: records
                .iter()
                .map(|r| Point {
                    id: &r.id,
                    vector: &r.vector,
                    payload: &r.payload,
                })
                .collect(),
        };

        let response = self
            .send(
                self.client
                    .put(self.url(&format!("/collections/{}/points?wait=true", collection)))
                    .json(&body),
            )
            .await?;
        Self::check(response, "upsert points").await?;

        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> AppResult<Vec<ScoredFragment>> {
        let body = SearchRequest {
            vector: query,
            limit: k,
            with_payload: true,
        };

        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/collections/{}/points/search", collection)))
                    .json(&body),
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let hits: Vec<SearchHit> = Self::parse(Self::check(response, "search").await?).await?;

        Ok(hits.into_iter().filter_map(into_scored).collect())
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, collection: &str) -> AppResult<bool> {
        let response = self
            .send(
                self.client
                    .delete(self.url(&format!("/collections/{}", collection))),
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        Self::parse(Self::check(response, "delete collection").await?).await
    }
}

/// Points written by other tools may lack our payload; skip them.
fn into_scored(hit: SearchHit) -> Option<ScoredFragment> {
    let payload = hit.payload?;
    let id = match hit.id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };

    Some(ScoredFragment {
        id,
        score: hit.score,
        payload,
    })
}
