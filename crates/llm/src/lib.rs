//! Generation provider crate for Abunda.
//!
//! This crate provides a provider-agnostic abstraction for talking to
//! Large Language Models. Both call styles used by the knowledge engine are
//! supported:
//! - fire-and-forget completions (`LlmClient::complete`)
//! - stateful multi-turn sessions (`ChatSession`, built on `LlmClient::chat`)
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Echo**: Offline client that answers deterministically and records requests
//!
//! # Example
//! ```no_run
//! use abunda_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(60))?;
//! let request = LlmRequest::new("Hello, world!", "llama3");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod client;
pub mod factory;
pub mod models;
pub mod providers;
pub mod transport;
pub mod types;

// Re-export main types
pub use chat::{ChatMessage, ChatRequest, ChatRole, ChatSession};
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use models::{pick_model, select_model};
pub use providers::{EchoClient, OllamaClient};
pub use transport::transport_error;
pub use types::GenerationOptions;
