//! Turn request/response wire types shared by the gateway and CLI.

use serde::{Deserialize, Serialize};

/// One user utterance. `user_id` must be non-empty; the HTTP boundary
/// rejects blank ids before a turn starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub user_id: String,
    pub message: String,
}

/// The completed turn. Optional fields are omitted from JSON when absent:
/// `used_tool` and `tool_latency_ms` only appear when a tool actually ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub answer: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_tool: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_latency_ms: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_latency_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_options_are_omitted() {
        let resp = TurnResponse {
            answer: "Hello.".into(),
            used_tool: None,
            tool_latency_ms: None,
            model_latency_ms: Some(12.5),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("used_tool"));
        assert!(!json.contains("tool_latency_ms"));
        assert!(json.contains("model_latency_ms"));
    }

    #[test]
    fn tool_turn_carries_all_fields() {
        let resp = TurnResponse {
            answer: "15°C and breezy.".into(),
            used_tool: Some("get_weather".into()),
            tool_latency_ms: Some(231.0),
            model_latency_ms: Some(410.2),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""used_tool":"get_weather""#));
        assert!(json.contains("tool_latency_ms"));
    }

    #[test]
    fn request_deserializes_from_client_json() {
        let req: TurnRequest =
            serde_json::from_str(r#"{"user_id": "u1", "message": "hi"}"#).unwrap();
        assert_eq!(req.user_id, "u1");
        assert_eq!(req.message, "hi");
    }
}
