//! The routing classification call.

use std::time::Instant;

use switchboard_core::error::LlmError;
use switchboard_core::llm::{ChatMessage, ChatModel, ChatRequest};
use switchboard_core::routing::RoutingDecision;

use crate::prompts::ROUTER_SYSTEM;

/// Outcome of one classification call.
pub struct RouteClassification {
    pub decision: RoutingDecision,
    /// Wall time of the model call, including any retries.
    pub latency_ms: f64,
}

/// Ask the model how to handle one utterance.
///
/// Temperature 0 and JSON mode keep the output as deterministic as the
/// backend allows. Output that fails to parse degrades to a final answer
/// rather than an error; only transport-level failures surface as `Err`.
pub async fn classify(
    model: &dyn ChatModel,
    user_text: &str,
) -> Result<RouteClassification, LlmError> {
    let request = ChatRequest::new(vec![
        ChatMessage::system(ROUTER_SYSTEM),
        ChatMessage::user(user_text),
    ])
    .with_temperature(0.0)
    .with_json_mode();

    let start = Instant::now();
    let completion = model.complete(request).await?;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok(RouteClassification {
        decision: RoutingDecision::parse_lenient(&completion.content),
        latency_ms,
    })
}
