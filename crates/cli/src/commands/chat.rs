//! Chat command handler.
//!
//! Interactive multi-turn session over stdin. `/reset` forgets the
//! conversation, `/exit` (or end of input) leaves.

use super::{print_answer, start_engine};
use abunda_core::{config::AppConfig, AppResult};
use abunda_knowledge::{Conversation, ConversationHistory};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive multi-turn session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Load the conversation from this JSON file and save it on exit
    #[arg(long)]
    pub history: Option<PathBuf>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let max_turns = config.history.max_turns;
        let history = match &self.history {
            Some(path) if path.exists() => ConversationHistory::load(path, max_turns)?,
            _ => ConversationHistory::new(max_turns),
        };

        let engine = start_engine(config).await?;
        let mut conversation = Conversation::new(engine, history);

        eprintln!("Ask a question. /reset starts over, /exit quits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("> ");
            std::io::stderr().flush().ok();

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match line.trim() {
                "" => continue,
                "/exit" | "/quit" => break,
                "/reset" => {
                    conversation.reset();
                    eprintln!("Conversation cleared.");
                }
                question => {
                    let response = conversation.ask(question).await;
                    print_answer(&response);
                    println!();
                }
            }
        }

        if let Some(path) = &self.history {
            conversation.history().save(path)?;
            tracing::debug!("Saved {} turns to {:?}", conversation.history().len(), path);
        }

        Ok(())
    }
}
