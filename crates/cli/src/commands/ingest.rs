//! Ingest command handler.
//!
//! Loads files and directories into the knowledge base, one document per
//! file. A failed document does not stop the others.

use super::{print_json, start_engine};
use abunda_core::{config::AppConfig, AppError, AppResult};
use abunda_knowledge::{discover_files, load_path, IngestOutcome, KnowledgeEngine};
use clap::Args;
use std::path::{Path, PathBuf};

/// Add documents to the knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest (directories are walked recursively)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Only ingest paths containing one of these substrings
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip paths containing one of these substrings
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let files = discover_files(&self.paths, &self.include, &self.exclude);
        if files.is_empty() {
            return Err(AppError::Config(
                "No files matched the given paths and filters".to_string(),
            ));
        }
        tracing::debug!("Discovered {} files", files.len());

        let engine = start_engine(config).await?;

        let mut outcomes = Vec::with_capacity(files.len());
        for file in &files {
            let outcome = ingest_file(&engine, file).await;
            if !self.json {
                print_outcome(&outcome);
            }
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        let fragments: usize = outcomes.iter().map(|o| o.fragment_count).sum();

        if self.json {
            print_json(&outcomes)?;
        } else {
            println!(
                "Ingested {} of {} documents ({} fragments)",
                outcomes.len() - failed,
                outcomes.len(),
                fragments
            );
        }

        if failed > 0 {
            return Err(AppError::Ingestion(format!(
                "{} of {} documents failed",
                failed,
                outcomes.len()
            )));
        }

        Ok(())
    }
}

async fn ingest_file(engine: &KnowledgeEngine, path: &Path) -> IngestOutcome {
    let document_id = path.to_string_lossy().to_string();

    let result = match load_path(path) {
        Ok(document) => engine.ingest(&document).await,
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        tracing::warn!("Failed to ingest {}: {}", document_id, e);
    }

    IngestOutcome::from_result(document_id, &result)
}

fn print_outcome(outcome: &IngestOutcome) {
    match &outcome.error {
        None => println!(
            "  ok    {} ({} fragments)",
            outcome.document_id, outcome.fragment_count
        ),
        Some(error) => println!("  fail  {}: {}", outcome.document_id, error),
    }
}
