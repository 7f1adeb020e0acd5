//! Generation provider implementations.

pub mod echo;
pub mod ollama;

pub use echo::EchoClient;
pub use ollama::OllamaClient;
