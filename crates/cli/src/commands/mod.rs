//! Command handlers for the Abunda CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod health;
pub mod ingest;
pub mod reset;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use health::HealthCommand;
pub use ingest::IngestCommand;
pub use reset::ResetCommand;

use abunda_core::{config::AppConfig, AppError, AppResult};
use abunda_knowledge::{EngineState, KnowledgeEngine, QueryResponse};
use std::sync::Arc;

/// Build the engine from configuration and run its dependency checks.
///
/// A degraded engine is still returned; its operations report the outage.
pub(crate) async fn start_engine(config: &AppConfig) -> AppResult<Arc<KnowledgeEngine>> {
    let engine = KnowledgeEngine::from_config(config)?;

    if let EngineState::Degraded { failures } = engine.initialize().await {
        for failure in &failures {
            eprintln!("warning: {}", failure);
        }
    }

    Ok(Arc::new(engine))
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Human-readable answer followed by its sources.
pub(crate) fn print_answer(response: &QueryResponse) {
    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &response.sources {
            println!(
                "- {} (part {}, score {:.3})",
                source.source_document_id, source.sequence_index, source.score
            );
        }
    }
}
