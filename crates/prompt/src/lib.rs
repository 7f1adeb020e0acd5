//! Prompt assembly for the Abunda knowledge assistant.
//!
//! This crate turns retrieved knowledge into the text a language model sees:
//! - YAML-based prompt definitions under `.abunda/prompts/`
//! - A built-in retrieval-augmented template used when none is defined
//! - Handlebars rendering of fragments, conversation history and the question

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, load_prompt, load_prompt_or_default};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, ContextFragment, HistoryLine, PromptContext,
    PromptContextConfig, PromptDefinition,
};
