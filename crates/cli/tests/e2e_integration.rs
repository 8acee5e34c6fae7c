//! End-to-end integration tests for the Switchboard turn pipeline.
//!
//! These tests run the real engine against scripted model output and a
//! canned tool: classification, slot backfill on follow-ups, transcript
//! persistence, the gateway HTTP surface, and the evaluation harness.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use switchboard_core::error::{LlmError, ToolError};
use switchboard_core::llm::{ChatCompletion, ChatModel, ChatRequest};
use switchboard_core::memory::SlotStore;
use switchboard_core::tool::{InputSchema, Tool, ToolInput, ToolRegistry};
use switchboard_core::transcript::Role;
use switchboard_memory::{InMemoryStore, IndexCache};
use switchboard_router::{parse_cases, run_eval, TurnRouter};

// ── Scripted model ───────────────────────────────────────────────────────

/// Returns scripted responses in sequence; panics when the script runs dry.
struct ScriptedModel {
    replies: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "e2e-mock"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let mut calls = self.calls.lock().unwrap();
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            panic!("ScriptedModel exhausted at call #{}", *calls + 1);
        }
        *calls += 1;
        Ok(ChatCompletion {
            content: replies.remove(0),
            model: "e2e-mock".into(),
            usage: None,
        })
    }
}

// ── Canned weather tool ──────────────────────────────────────────────────

/// Deterministic weather stand-in that records every input it receives.
struct CannedWeather {
    seen: Arc<Mutex<Vec<ToolInput>>>,
}

#[async_trait]
impl Tool for CannedWeather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a location."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::from([("location".to_string(), "city name".to_string())])
    }

    async fn run(&self, input: &ToolInput) -> Result<String, ToolError> {
        self.seen.lock().unwrap().push(input.clone());
        let location = input.get("location").and_then(|v| v.as_str()).unwrap_or("?");
        Ok(format!("Weather in {location}: clear, 21C"))
    }
}

fn weather_registry(seen: Arc<Mutex<Vec<ToolInput>>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CannedWeather { seen }));
    registry
}

const WEATHER_PARIS: &str = r#"{"type":"tool","action":"get_weather","input":{"location":"Paris"}}"#;
const WEATHER_NO_INPUT: &str = r#"{"type":"tool","action":"get_weather","input":{}}"#;
const FINAL: &str = r#"{"type":"final","answer":"proposed"}"#;

// ── E2E: tool turn plus follow-up backfill ───────────────────────────────

#[tokio::test]
async fn e2e_weather_turn_then_followup_backfill() {
    let model = Arc::new(ScriptedModel::new(&[
        WEATHER_PARIS,
        "Sunny in Paris.",
        WEATHER_NO_INPUT,
        "Still sunny in Paris.",
    ]));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(InMemoryStore::new());
    let router = TurnRouter::new(
        model.clone(),
        weather_registry(seen.clone()),
        store.clone(),
        IndexCache::new(8, 128),
    );

    let first = router
        .handle_turn("e2e", "What is the weather in Paris?")
        .await
        .expect("first turn should succeed");
    assert_eq!(first.answer, "Sunny in Paris.");
    assert_eq!(first.used_tool.as_deref(), Some("get_weather"));
    assert!(first.tool_latency_ms.is_some());

    // Follow-up: the classifier omits the location, memory fills it back in.
    let second = router
        .handle_turn("e2e", "what about there now")
        .await
        .expect("second turn should succeed");
    assert_eq!(second.answer, "Still sunny in Paris.");
    assert_eq!(second.used_tool.as_deref(), Some("get_weather"));

    let inputs = seen.lock().unwrap();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].get("location").and_then(|v| v.as_str()), Some("Paris"));
    assert_eq!(inputs[1].get("location").and_then(|v| v.as_str()), Some("Paris"));
    drop(inputs);

    // Both turns landed in the transcript, oldest first.
    let transcript = store.recent_messages("e2e", 10).await.unwrap();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[0].content, "What is the weather in Paris?");
    assert_eq!(transcript[3].role, Role::Assistant);
    assert_eq!(transcript[3].content, "Still sunny in Paris.");

    // classify + compose, twice
    assert_eq!(model.calls(), 4);
}

// ── E2E: direct answers never touch tools ────────────────────────────────

#[tokio::test]
async fn e2e_direct_turn_uses_no_tools() {
    let model = Arc::new(ScriptedModel::new(&[FINAL, "Hello! How can I help?"]));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(InMemoryStore::new());
    let router = TurnRouter::new(
        model.clone(),
        weather_registry(seen.clone()),
        store.clone(),
        IndexCache::new(8, 128),
    );

    let response = router.handle_turn("e2e", "Hi there!").await.unwrap();

    assert_eq!(response.answer, "Hello! How can I help?");
    assert!(response.used_tool.is_none());
    assert!(response.tool_latency_ms.is_none());
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(model.calls(), 2);
}

// ── E2E: gateway HTTP surface ────────────────────────────────────────────

#[tokio::test]
async fn e2e_gateway_health_and_chat_roundtrip() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let model = Arc::new(ScriptedModel::new(&[FINAL, "Hi from the gateway."]));
    let router = TurnRouter::new(
        model,
        ToolRegistry::new(),
        Arc::new(InMemoryStore::new()),
        IndexCache::new(8, 128),
    );
    let state = Arc::new(switchboard_gateway::AppState {
        router: Arc::new(router),
        auth_token: None,
        rate_limit_per_minute: 60,
    });
    let app = switchboard_gateway::build_router(state);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let health: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model"], "e2e-mock");

    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({"user_id": "e2e", "message": "hi"}).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["answer"], "Hi from the gateway.");
    assert!(body.get("used_tool").is_none());
}

// ── E2E: evaluation harness ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_eval_cases_score_routing() {
    let yaml = r#"
- id: weather
  question: "What is the weather in Paris?"
  expect_action: get_weather
- id: greeting
  question: "Hello"
  expect_action: none
"#;
    let cases = parse_cases(yaml).unwrap();
    assert_eq!(cases.len(), 2);

    let model = Arc::new(ScriptedModel::new(&[WEATHER_PARIS, FINAL]));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let router = TurnRouter::new(
        model,
        weather_registry(seen),
        Arc::new(InMemoryStore::new()),
        IndexCache::new(8, 128),
    );

    let report = run_eval(&router, &cases).await.unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.route_ok, 2);
    assert_eq!(report.summary.route_accuracy, 1.0);
    assert_eq!(report.summary.contains_checked, 0);
    assert_eq!(report.results[0].predicted_action, "get_weather");
    assert_eq!(report.results[1].predicted_action, "none");
}

// ── E2E: configuration defaults ──────────────────────────────────────────

#[tokio::test]
async fn e2e_config_defaults_are_usable() {
    let config = switchboard_config::AppConfig::default();

    assert!(config.validate().is_ok());
    assert!(!config.llm.model.is_empty());
    assert!(config.gateway.port > 0);
    assert!(!config.gateway.host.is_empty());

    let starter = switchboard_config::AppConfig::default_toml();
    assert!(starter.starts_with('#'));
    assert!(starter.contains("[llm]"));
}
