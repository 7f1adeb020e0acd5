//! LLM provider factory.
//!
//! Builds the generation client named by the `generation` section of the
//! application configuration.

use crate::client::LlmClient;
use crate::providers::{EchoClient, OllamaClient};
use abunda_core::config::GenerationSettings;
use abunda_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client for the configured provider.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, and propagates
/// HTTP client construction failures.
pub fn create_client(settings: &GenerationSettings) -> AppResult<Arc<dyn LlmClient>> {
    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            let client = OllamaClient::new(
                &settings.endpoint,
                Duration::from_secs(settings.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        "echo" => Ok(Arc::new(
            EchoClient::new().with_models(vec![settings.model.clone()]),
        )),
        other => Err(AppError::Config(format!(
            "Unknown generation provider: {}",
            other
        ))),
    }
}
