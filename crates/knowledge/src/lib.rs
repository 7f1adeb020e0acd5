//! Knowledge engine for Abunda.
//!
//! Turns documents into embedded fragments in a vector store and answers
//! questions by retrieving the closest fragments and handing them to a
//! generation provider.
//!
//! - [`loader`]: bytes and files to plain-text [`Document`]s
//! - [`chunker`]: documents to overlapping [`Fragment`]s
//! - [`embeddings`]: text to vectors
//! - [`store`]: vector persistence and top-k search
//! - [`engine`]: the stateful [`KnowledgeEngine`]
//! - [`history`]: multi-turn conversations

pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod history;
pub mod loader;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use chunker::Chunker;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use engine::{
    Dependency, DependencyFailure, EngineSettings, EngineState, HealthReport, IngestOutcome,
    IngestReport, KnowledgeEngine, QueryResponse, QueryStatus, SourceRef,
};
pub use history::{Conversation, ConversationHistory, ConversationTurn, Role};
pub use loader::{discover_files, load_bytes, load_path, ContentType, Document};
pub use store::{create_store, VectorStore};
pub use types::{Collection, CollectionInfo, Fragment, FragmentPayload, ScoredFragment, VectorRecord};
