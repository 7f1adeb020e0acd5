//! Abunda CLI
//!
//! Main entry point for the abunda command-line tool.
//! Ingests documents into the knowledge base and answers questions from it.

mod commands;

use abunda_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, HealthCommand, IngestCommand, ResetCommand};
use std::path::PathBuf;

/// Abunda - answers questions from your organization's documents
#[derive(Parser, Debug)]
#[command(name = "abunda")]
#[command(about = "Knowledge assistant over your own documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "ABUNDA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "ABUNDA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Knowledge collection name
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add documents to the knowledge base
    Ingest(IngestCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Interactive multi-turn session
    Chat(ChatCommand),

    /// Check the vector store and model providers
    Health(HealthCommand),

    /// Delete the knowledge collection
    Reset(ResetCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Health(_) => "health",
            Commands::Reset(_) => "reset",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.model,
        cli.collection,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Abunda CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Vector store: {} ({})",
        config.vector_store.provider,
        config.vector_store.collection_name
    );
    tracing::debug!("Generation model: {}", config.generation.model);

    config.ensure_abunda_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Health(cmd) => cmd.execute(&config).await,
        Commands::Reset(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
