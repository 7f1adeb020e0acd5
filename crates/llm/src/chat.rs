//! Chat messages and stateful chat sessions.

use crate::client::LlmClient;
use crate::types::GenerationOptions;
use abunda_core::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat completion request: the whole conversation so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,

    /// Messages in conversation order
    pub messages: Vec<ChatMessage>,

    /// Sampling parameters
    #[serde(default)]
    pub options: GenerationOptions,
}

/// A multi-turn conversation with a generation provider.
///
/// The session keeps the message list locally and replays it on every
/// `send`, so it works with stateless HTTP chat endpoints. A failed send
/// leaves the history as it was before the call.
pub struct ChatSession {
    client: Arc<dyn LlmClient>,
    model: String,
    options: GenerationOptions,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a session seeded with an optional system instruction and prior turns.
    pub fn start(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        system: Option<String>,
        history: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.extend(history);

        Self {
            client,
            model: model.into(),
            options,
            messages,
        }
    }

    /// Send a user message and return the assistant's reply.
    pub async fn send(&mut self, message: impl Into<String>) -> AppResult<String> {
        self.messages.push(ChatMessage::user(message));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.messages.clone(),
            options: self.options,
        };

        match self.client.chat(&request).await {
            Ok(response) => {
                self.messages
                    .push(ChatMessage::assistant(response.content.clone()));
                Ok(response.content)
            }
            Err(e) => {
                self.messages.pop();
                Err(e)
            }
        }
    }

    /// Messages exchanged so far, including the system instruction.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}
