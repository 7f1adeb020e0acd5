//! Reset command handler.

use super::start_engine;
use abunda_core::{config::AppConfig, AppError, AppResult};
use clap::Args;

/// Delete the knowledge collection
#[derive(Args, Debug)]
pub struct ResetCommand {
    /// Confirm deletion of every ingested fragment
    #[arg(long)]
    pub yes: bool,
}

impl ResetCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing reset command");

        if !self.yes {
            return Err(AppError::Config(format!(
                "Refusing to delete collection '{}' without --yes",
                config.vector_store.collection_name
            )));
        }

        let engine = start_engine(config).await?;
        let existed = engine.reset().await?;

        if existed {
            println!(
                "Collection '{}' deleted",
                config.vector_store.collection_name
            );
        } else {
            println!(
                "Collection '{}' did not exist",
                config.vector_store.collection_name
            );
        }

        Ok(())
    }
}
