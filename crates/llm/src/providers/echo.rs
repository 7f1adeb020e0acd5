//! Offline generation provider.
//!
//! Answers every request by echoing the last line it was given and keeps a
//! copy of each request. Useful for dry runs without a model server and for
//! asserting what the knowledge engine sent to the model.

use crate::chat::{ChatRequest, ChatRole};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use abunda_core::{AppError, AppResult};
use std::sync::Mutex;

/// Deterministic in-process LLM client.
#[derive(Debug, Default)]
pub struct EchoClient {
    models: Vec<String>,
    failing: bool,
    completions: Mutex<Vec<LlmRequest>>,
    chats: Mutex<Vec<ChatRequest>>,
}

impl EchoClient {
    pub fn new() -> Self {
        Self {
            models: vec!["echo".to_string()],
            ..Default::default()
        }
    }

    /// Report these models from `list_models`.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Make every call fail as if the provider were offline.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Completion requests received so far.
    pub fn completion_requests(&self) -> Vec<LlmRequest> {
        self.completions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Chat requests received so far.
    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Total number of generation calls (completion and chat).
    pub fn call_count(&self) -> usize {
        self.completion_requests().len() + self.chat_requests().len()
    }

    fn check_online(&self) -> AppResult<()> {
        if self.failing {
            Err(AppError::Unavailable("echo provider is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn reply(model: &str, input: &str) -> LlmResponse {
        let last_line = input
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim();

        LlmResponse {
            content: format!("[{}] {}", model, last_line),
            model: model.to_string(),
            usage: LlmUsage::new(input.split_whitespace().count() as u32, 0),
            done: true,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for EchoClient {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.check_online()?;
        self.completions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        Ok(Self::reply(&request.model, &request.prompt))
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<LlmResponse> {
        self.check_online()?;
        self.chats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        Ok(Self::reply(&request.model, last_user))
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        self.check_online()?;
        Ok(self.models.clone())
    }
}
