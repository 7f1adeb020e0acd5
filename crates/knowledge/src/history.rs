//! Conversation history for multi-turn sessions.
//!
//! History belongs to the caller: the engine reads it for each question but
//! never stores it. [`Conversation`] is the convenience wrapper that keeps a
//! session's turns and feeds them back on every question.

use crate::engine::{KnowledgeEngine, QueryResponse, QueryStatus};
use abunda_core::{AppError, AppResult};
use abunda_llm::ChatMessage;
use abunda_prompt::HistoryLine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Who said a turn.
///
/// Any role other than `user` is read as the assistant, so histories that
/// label the model `"model"` or `"assistant"` both load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Assistant,
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// The last `max_turns` non-empty turns of `turns`, in order.
pub fn recent_turns(turns: &[ConversationTurn], max_turns: usize) -> Vec<ConversationTurn> {
    let kept: Vec<&ConversationTurn> = turns.iter().filter(|t| !t.is_blank()).collect();
    let skip = kept.len().saturating_sub(max_turns);
    kept.into_iter().skip(skip).cloned().collect()
}

/// Turns rendered for a completion prompt.
pub fn to_prompt_lines(turns: &[ConversationTurn]) -> Vec<HistoryLine> {
    turns
        .iter()
        .map(|t| HistoryLine {
            role: t.role.label().to_string(),
            content: t.content.clone(),
        })
        .collect()
}

/// Turns replayed as chat messages.
pub fn to_chat_messages(turns: &[ConversationTurn]) -> Vec<ChatMessage> {
    turns
        .iter()
        .map(|t| match t.role {
            Role::User => ChatMessage::user(t.content.clone()),
            Role::Assistant => ChatMessage::assistant(t.content.clone()),
        })
        .collect()
}

/// An ordered, bounded list of turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    max_turns: usize,
}

impl ConversationHistory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Build from existing turns, dropping empty ones and keeping the newest.
    pub fn from_turns(turns: Vec<ConversationTurn>, max_turns: usize) -> Self {
        Self {
            turns: recent_turns(&turns, max_turns),
            max_turns,
        }
    }

    /// Load a JSON array of `{role, content}` objects.
    pub fn load(path: &Path, max_turns: usize) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read history file {:?}: {}", path, e))
        })?;
        let turns: Vec<ConversationTurn> = serde_json::from_str(&raw)?;
        Ok(Self::from_turns(turns, max_turns))
    }

    /// Write the turns as a JSON array.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(&self.turns)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if turn.is_blank() {
            return;
        }
        self.turns.push(turn);
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// A chat session against the knowledge engine.
///
/// Only answered questions are recorded; an offline or failed turn leaves
/// the history untouched so the user can simply ask again.
pub struct Conversation {
    engine: Arc<KnowledgeEngine>,
    history: ConversationHistory,
}

impl Conversation {
    pub fn new(engine: Arc<KnowledgeEngine>, history: ConversationHistory) -> Self {
        Self { engine, history }
    }

    pub async fn ask(&mut self, question: &str) -> QueryResponse {
        let response = self.engine.query(question, self.history.turns()).await;

        if response.status == QueryStatus::Answered {
            self.history.push(ConversationTurn::user(question));
            self.history
                .push(ConversationTurn::assistant(response.answer.clone()));
        }

        response
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Forget all prior turns.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
