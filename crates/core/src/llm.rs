//! The language model abstraction.
//!
//! `ChatModel` is the only seam between the router and whatever serves
//! completions. Implementations live in the providers crate; tests script
//! their own. Two call sites exist: the route classifier (temperature 0,
//! JSON mode) and the answer composer (temperature 0.2, plain text).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a chat message sent to the model. Distinct from the transcript
/// [`Role`](crate::transcript::Role): the model also sees system prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in a model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// A completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the implementation's default model when set.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the backend for a strict JSON object response.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: 0.2,
            max_tokens: None,
            json_mode: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Token accounting reported by the backend, when available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completed model response.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Anything that can serve chat completions.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier for logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError>;
}
