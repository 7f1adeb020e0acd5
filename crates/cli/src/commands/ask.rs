//! Ask command handler.
//!
//! Answers one question from the knowledge base, optionally continuing a
//! conversation stored in a JSON history file.

use super::{print_answer, print_json, start_engine};
use abunda_core::{config::AppConfig, AppResult};
use abunda_knowledge::{ConversationHistory, ConversationTurn, QueryStatus};
use clap::Args;
use std::path::PathBuf;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// JSON file of prior turns (`[{"role": "user", "content": "..."}]`)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Append this exchange to the history file when answered
    #[arg(long, requires = "history")]
    pub save_history: bool,

    /// Number of fragments to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let mut config = config.clone();
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }

        let mut history = match &self.history {
            Some(path) if path.exists() => ConversationHistory::load(path, config.history.max_turns)?,
            _ => ConversationHistory::new(config.history.max_turns),
        };
        tracing::debug!("Loaded {} history turns", history.len());

        let engine = start_engine(&config).await?;
        let response = engine.query(&self.question, history.turns()).await;

        tracing::debug!(
            "Query status {:?} with {} sources",
            response.status,
            response.sources.len()
        );

        if self.json {
            print_json(&response)?;
        } else {
            print_answer(&response);
        }

        if let (true, Some(path)) = (self.save_history, &self.history) {
            if response.status == QueryStatus::Answered {
                history.push(ConversationTurn::user(self.question.clone()));
                history.push(ConversationTurn::assistant(response.answer.clone()));
                history.save(path)?;
            }
        }

        Ok(())
    }
}
