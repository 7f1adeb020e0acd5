//! Knowledge system type definitions.

use abunda_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Range;
use uuid::Uuid;

/// A chunk of a document's text, in source order.
///
/// Fragments are never edited after ingestion; re-ingesting a document
/// produces new fragments (or the same ones, if the text is unchanged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Deterministic fragment identifier (see [`fragment_id`])
    pub id: String,

    /// Identifier of the document this fragment came from
    pub source_document_id: String,

    /// Position of this fragment within its document
    pub sequence_index: usize,

    /// Fragment text, equal to `document.text[byte_range]`
    pub text: String,

    /// Byte range in the document text
    pub byte_range: Range<usize>,

    /// Embedding vector, once computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Fragment {
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Convert an embedded fragment into the record a vector store keeps.
    ///
    /// # Errors
    /// `AppError::Ingestion` if the fragment has not been embedded yet.
    pub fn into_record(self, content_type: &str, ingested_at: &str) -> AppResult<VectorRecord> {
        let vector = self.embedding.ok_or_else(|| {
            AppError::Ingestion(format!(
                "fragment {} of {} has no embedding",
                self.sequence_index, self.source_document_id
            ))
        })?;

        Ok(VectorRecord {
            id: self.id,
            vector,
            payload: FragmentPayload {
                source_document_id: self.source_document_id,
                sequence_index: self.sequence_index,
                text: self.text,
                content_type: content_type.to_string(),
                ingested_at: ingested_at.to_string(),
            },
        })
    }
}

/// Compute the identifier of a fragment.
///
/// A name-based UUID over the document id, a digest of the whole document
/// text and the sequence index. Identical content always maps to identical
/// ids, so re-ingesting a document overwrites its fragments in place.
pub fn fragment_id(document_id: &str, document_text: &str, sequence_index: usize) -> String {
    let digest = Sha256::digest(document_text.as_bytes());
    let name = format!("{}:{:x}:{}", document_id, digest, sequence_index);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentPayload {
    pub source_document_id: String,
    pub sequence_index: usize,
    pub text: String,
    pub content_type: String,
    /// RFC 3339 timestamp of the ingestion that wrote this record
    pub ingested_at: String,
}

/// A vector plus its payload, ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: FragmentPayload,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub id: String,
    /// Cosine similarity to the query vector
    pub score: f32,
    pub payload: FragmentPayload,
}

/// What a vector store reports about a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub dimension: usize,
    pub fragment_count: u64,
}

/// The engine's handle on its knowledge collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub dimension: usize,
    pub fragment_count: u64,
}

impl Collection {
    pub fn from_info(name: impl Into<String>, info: CollectionInfo) -> Self {
        Self {
            name: name.into(),
            dimension: info.dimension,
            fragment_count: info.fragment_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragment_count == 0
    }
}

/// Cosine similarity between two vectors.
///
/// Mismatched lengths and zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
