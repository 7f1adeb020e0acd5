//! Prompt types for the Abunda knowledge assistant.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Context injection settings
    #[serde(default)]
    pub context: PromptContextConfig,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// Which parts of the request are handed to the template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContextConfig {
    /// Expose retrieved fragments as `fragments`
    #[serde(rename = "includeKnowledgeBase", default = "default_true")]
    pub include_knowledge_base: bool,

    /// Expose prior turns as `history`
    #[serde(rename = "includeHistory", default = "default_true")]
    pub include_history: bool,
}

impl Default for PromptContextConfig {
    fn default() -> Self {
        Self {
            include_knowledge_base: true,
            include_history: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A retrieved fragment as it appears in the prompt frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFragment {
    /// Source document identifier
    pub source: String,

    /// Position of the fragment within its document
    pub sequence: usize,

    /// Fragment text
    pub text: String,
}

/// One prior turn, already labelled for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLine {
    /// "User" or "Assistant"
    pub role: String,
    pub content: String,
}

/// Everything a template can draw on for a single question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub question: String,
    pub fragments: Vec<ContextFragment>,
    pub history: Vec<HistoryLine>,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of fragments rendered into the frame
    #[serde(rename = "fragmentCount")]
    pub fragment_count: usize,

    /// Number of history turns rendered
    #[serde(rename = "historyTurns")]
    pub history_turns: usize,
}
