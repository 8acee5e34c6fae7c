//! The routing decision: what the classifier is allowed to say.
//!
//! Exactly two shapes exist on the wire:
//!
//! ```json
//! {"type": "tool", "action": "get_weather", "input": {"location": "Paris"}}
//! {"type": "final", "answer": "The Eiffel Tower is 330 m tall."}
//! ```
//!
//! Anything else is a parse failure, and parse failures never surface:
//! the raw text degrades to a `Final` so a chatty or confused model
//! costs us a routing opportunity, not a turn.

use serde::{Deserialize, Serialize};

use crate::tool::ToolInput;

/// One routing decision per turn: invoke a tool, or answer directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RoutingDecision {
    Tool {
        action: String,
        #[serde(default)]
        input: ToolInput,
    },
    Final {
        answer: String,
    },
}

impl RoutingDecision {
    /// Parse a classifier reply, degrading malformed output to a `Final`
    /// carrying the raw text.
    pub fn parse_lenient(raw: &str) -> Self {
        serde_json::from_str(raw.trim()).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "malformed routing decision, degrading to final answer");
            RoutingDecision::Final {
                answer: raw.to_string(),
            }
        })
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, RoutingDecision::Tool { .. })
    }
}
