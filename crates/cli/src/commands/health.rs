//! Health command handler.

use super::{print_json, start_engine};
use abunda_core::{config::AppConfig, AppError, AppResult};
use abunda_knowledge::HealthReport;
use clap::Args;

/// Check the vector store and model providers
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing health command");

        let engine = start_engine(config).await?;
        let report = engine.health_status().await;

        if self.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }

        if report.state != "active" {
            return Err(AppError::Unavailable(format!(
                "knowledge engine is {}",
                report.state
            )));
        }

        Ok(())
    }
}

fn print_report(report: &HealthReport) {
    println!("State: {}", report.state);
    println!(
        "Collection: {} ({})",
        report.collection_name,
        if report.collection_present {
            format!("{} fragments", report.fragment_count)
        } else {
            "not created yet".to_string()
        }
    );
    println!("Vector store: {}", report.vector_store);
    match report.embedding_dimension {
        Some(d) => println!("Embedding model: {} ({} dimensions)", report.embedding_model, d),
        None => println!("Embedding model: {}", report.embedding_model),
    }
    println!("Generation model: {}", report.generation_model);

    for failure in &report.failures {
        println!("  ! {}", failure);
    }
}
