//! Embedding providers.
//!
//! The knowledge engine only sees the [`EmbeddingProvider`] trait; concrete
//! providers are picked from the `embedding` configuration section.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, TrigramProvider};
