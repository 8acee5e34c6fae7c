//! OpenAI-compatible chat backend.
//!
//! Works with OpenAI itself and with anything that exposes the
//! `/v1/chat/completions` shape (OpenRouter, vLLM, Ollama, proxies).
//! The router only ever needs plain completions, so there is no tool-call
//! or streaming plumbing here; JSON mode is requested through
//! `response_format` when the caller asks for it.

use async_trait::async_trait;
use serde::Deserialize;
use switchboard_core::error::LlmError;
use switchboard_core::llm::{ChatCompletion, ChatModel, ChatRequest, Usage};
use tracing::{debug, warn};

/// Fallback wait when a 429 arrives without a usable Retry-After header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// A chat model served over an OpenAI-compatible HTTP API.
pub struct OpenAiChatModel {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    /// Create a client against `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// `api_key` may be absent for local endpoints that skip auth. The
    /// timeout bounds the whole request; connection setup gets a shorter one.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            client,
        }
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let model = request.model.as_deref().unwrap_or(&self.model);

        let mut body = serde_json::json!({
            "model": model,
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if request.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        body
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request);

        debug!(model = %self.model, json_mode = request.json_mode, "Sending completion request");

        let mut http_request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {key}"));
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(e.to_string())
            } else {
                LlmError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(LlmError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(LlmError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model API returned error");
            return Err(LlmError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatCompletion {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model,
            usage,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
