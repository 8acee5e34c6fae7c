//! Answer composition: guarded tool polish and plain direct answers.

use std::time::Instant;

use switchboard_core::error::LlmError;
use switchboard_core::llm::{ChatMessage, ChatModel, ChatRequest};

use crate::prompts::{self, DIRECT_SYSTEM, POLISH_SYSTEM};

/// Outcome of one composition call.
pub struct Composed {
    pub answer: String,
    /// Wall time of the model call, including any retries.
    pub latency_ms: f64,
}

async fn complete_timed(
    model: &dyn ChatModel,
    system: &str,
    prompt: String,
) -> Result<Composed, LlmError> {
    let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(prompt)])
        .with_temperature(0.2);

    let start = Instant::now();
    let completion = model.complete(request).await?;
    Ok(Composed {
        answer: completion.content,
        latency_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Turn a raw tool result into a user-facing answer under the guard that
/// keeps the model from straying beyond the tool output.
pub async fn polish_tool_answer(
    model: &dyn ChatModel,
    user_text: &str,
    action: &str,
    raw: &str,
    snippets: &[String],
) -> Result<Composed, LlmError> {
    complete_timed(
        model,
        POLISH_SYSTEM,
        prompts::tool_answer_prompt(user_text, action, raw, snippets),
    )
    .await
}

/// Answer without a tool, optionally grounded in prior-turn snippets.
pub async fn answer_directly(
    model: &dyn ChatModel,
    user_text: &str,
    snippets: &[String],
) -> Result<Composed, LlmError> {
    complete_timed(model, DIRECT_SYSTEM, prompts::direct_prompt(user_text, snippets)).await
}
