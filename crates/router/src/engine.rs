//! The per-turn orchestration engine.
//!
//! One `TurnRouter` serves all users: classify the utterance, run a tool
//! when one was chosen (with slot backfill before and slot persistence
//! after), then compose the final answer. The user message goes into the
//! snippet index up front; transcript appends and the answer's index entry
//! happen only once the turn has produced an answer, so a failed turn
//! leaves the transcript untouched.

use std::sync::Arc;
use std::time::Instant;

use switchboard_config::AppConfig;
use switchboard_core::error::Error;
use switchboard_core::llm::ChatModel;
use switchboard_core::memory::SlotStore;
use switchboard_core::routing::RoutingDecision;
use switchboard_core::tool::ToolRegistry;
use switchboard_core::transcript::Role;
use switchboard_core::turn::TurnResponse;
use switchboard_memory::{IndexCache, SqliteStore};
use switchboard_tools::default_registry;
use tracing::{debug, info, warn};

use crate::compose::{answer_directly, polish_tool_answer};
use crate::context::ContextResolver;

/// How many prior-turn snippets a composition prompt may carry.
const SNIPPET_K: usize = 2;

pub struct TurnRouter {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    store: Arc<dyn SlotStore>,
    context: ContextResolver,
}

impl TurnRouter {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        store: Arc<dyn SlotStore>,
        indexes: IndexCache,
    ) -> Self {
        let context = ContextResolver::new(store.clone(), indexes);
        Self {
            model,
            tools,
            store,
            context,
        }
    }

    /// Assemble the full production stack from configuration: retry-wrapped
    /// model, SQLite-backed slot store, built-in tools, bounded index cache.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let model = switchboard_providers::build_from_config(config);
        let store = Arc::new(SqliteStore::new(&config.memory.database_url).await?);
        let tools = default_registry(&config.tools);
        let indexes = IndexCache::new(config.memory.index_capacity, config.memory.embedding_dim);
        Ok(Self::new(model, tools, store, indexes))
    }

    /// Model identifier for health reporting.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Registered action names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    /// Classify one utterance without running the rest of the turn.
    /// Used by the evaluation harness for route-accuracy scoring.
    pub async fn classify(&self, user_text: &str) -> Result<RoutingDecision, Error> {
        let classification = crate::classify::classify(self.model.as_ref(), user_text).await?;
        Ok(classification.decision)
    }

    /// Run one conversational turn for a user.
    pub async fn handle_turn(&self, user_id: &str, message: &str) -> Result<TurnResponse, Error> {
        info!(user_id, "Turn started");
        self.context.index_message(user_id, Role::User, message);

        let response = self.route_and_answer(user_id, message).await?;

        self.store.append_message(user_id, Role::User, message).await?;
        self.store
            .append_message(user_id, Role::Assistant, &response.answer)
            .await?;
        self.context
            .index_message(user_id, Role::Assistant, &response.answer);

        info!(
            user_id,
            used_tool = response.used_tool.as_deref().unwrap_or("none"),
            model_latency_ms = response.model_latency_ms.unwrap_or_default(),
            tool_latency_ms = response.tool_latency_ms.unwrap_or_default(),
            "Turn finished"
        );
        Ok(response)
    }

    async fn route_and_answer(&self, user_id: &str, user_text: &str) -> Result<TurnResponse, Error> {
        let classification = crate::classify::classify(self.model.as_ref(), user_text).await?;

        let RoutingDecision::Tool { action, input } = classification.decision else {
            // The classifier's proposed answer text is discarded; the
            // composer answers from the user text plus any snippets.
            return self
                .answer_without_tool(user_id, user_text, classification.latency_ms)
                .await;
        };

        let Some(tool) = self.tools.get(&action) else {
            warn!(
                user_id,
                action = %action,
                "Classifier chose an unregistered action, answering directly"
            );
            return self
                .answer_without_tool(user_id, user_text, classification.latency_ms)
                .await;
        };

        let resolved = self
            .context
            .resolve_tool_inputs(user_id, &action, input, &tool.input_schema(), user_text)
            .await?;

        debug!(user_id, tool = %action, "Running tool");
        let started = Instant::now();
        let raw = tool.run(&resolved).await?;
        let tool_latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.context
            .persist_tool_memory(user_id, &action, &resolved)
            .await?;

        let snippets = if self
            .context
            .should_include_history(user_id, &action, user_text)
            .await?
        {
            self.context.select_snippets(user_id, user_text, SNIPPET_K)
        } else {
            Vec::new()
        };

        let composed =
            polish_tool_answer(self.model.as_ref(), user_text, &action, &raw, &snippets).await?;

        Ok(TurnResponse {
            answer: composed.answer,
            used_tool: Some(action),
            tool_latency_ms: Some(tool_latency_ms),
            model_latency_ms: Some(classification.latency_ms + composed.latency_ms),
        })
    }

    async fn answer_without_tool(
        &self,
        user_id: &str,
        user_text: &str,
        classify_latency_ms: f64,
    ) -> Result<TurnResponse, Error> {
        let snippets = self.context.select_snippets(user_id, user_text, SNIPPET_K);
        let composed = answer_directly(self.model.as_ref(), user_text, &snippets).await?;
        Ok(TurnResponse {
            answer: composed.answer,
            used_tool: None,
            tool_latency_ms: None,
            model_latency_ms: Some(classify_latency_ms + composed.latency_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{KeywordClassifier, ScriptedModel, StubTool};
    use switchboard_memory::InMemoryStore;

    const WEATHER_DECISION: &str =
        r#"{"type":"tool","action":"get_weather","input":{"location":"Paris"}}"#;

    fn registry_with(tools: &[StubTool]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(Box::new(tool.clone()));
        }
        registry
    }

    fn router_with(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        store: Arc<InMemoryStore>,
    ) -> TurnRouter {
        TurnRouter::new(model, tools, store, IndexCache::new(8, 384))
    }

    #[tokio::test]
    async fn weather_turn_end_to_end() {
        let store = Arc::new(InMemoryStore::new());
        let weather = StubTool::new(
            "get_weather",
            "location",
            "Current weather at Paris: 15\u{b0}C, wind 10 km/h.",
        );
        let model = Arc::new(ScriptedModel::new([
            WEATHER_DECISION,
            "It is 15\u{b0}C in Paris with 10 km/h wind.",
        ]));
        let router = router_with(model.clone(), registry_with(&[weather.clone()]), store.clone());

        let response = router
            .handle_turn("u1", "What's the weather in Paris?")
            .await
            .unwrap();

        assert_eq!(response.answer, "It is 15\u{b0}C in Paris with 10 km/h wind.");
        assert_eq!(response.used_tool.as_deref(), Some("get_weather"));
        assert!(response.tool_latency_ms.is_some());
        assert!(response.model_latency_ms.is_some());

        // the tool saw the classifier's location
        assert_eq!(weather.call_count(), 1);
        assert_eq!(
            weather.input(0).get("location").and_then(|v| v.as_str()),
            Some("Paris")
        );

        // the polish call carried the raw tool output under the guard
        let polish = model.request(1);
        assert!(
            polish.messages[1]
                .content
                .contains("Tool get_weather returned: Current weather at Paris")
        );

        // transcript recorded both sides, slots remembered the location
        let recent = store.recent_messages("u1", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[1].role, Role::Assistant);
        assert_eq!(
            store
                .get_slot("u1", "get_weather", "location", None)
                .await
                .unwrap()
                .as_deref(),
            Some("Paris")
        );
        assert_eq!(
            store
                .get_slot("u1", "meta", "last_tool", None)
                .await
                .unwrap()
                .as_deref(),
            Some("get_weather")
        );
    }

    #[tokio::test]
    async fn followup_turn_backfills_the_remembered_location() {
        let store = Arc::new(InMemoryStore::new());
        let weather = StubTool::new(
            "get_weather",
            "location",
            "Current weather at Paris: 15\u{b0}C, wind 10 km/h.",
        );
        let model = Arc::new(ScriptedModel::new([
            WEATHER_DECISION,
            "15 degrees with 10 km/h wind in Paris.",
            r#"{"type":"tool","action":"get_weather","input":{}}"#,
            "Still 15 degrees in Paris.",
        ]));
        let router = router_with(model.clone(), registry_with(&[weather.clone()]), store);

        router
            .handle_turn("u1", "What's the weather in Paris?")
            .await
            .unwrap();
        let second = router.handle_turn("u1", "what about it now").await.unwrap();

        assert_eq!(second.used_tool.as_deref(), Some("get_weather"));
        assert_eq!(second.answer, "Still 15 degrees in Paris.");

        // the classifier sent no location; memory supplied the earlier one
        assert_eq!(weather.call_count(), 2);
        assert_eq!(
            weather.input(1).get("location").and_then(|v| v.as_str()),
            Some("Paris")
        );

        // same tool + follow-up wording means the polish prompt carried context
        let polish = model.request(3);
        assert!(polish.messages[1].content.contains("Relevant prior context:"));
    }

    #[tokio::test]
    async fn classifier_locations_are_not_overwritten_by_memory() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_slot("u1", "get_weather", "location", "Paris")
            .await
            .unwrap();
        let weather = StubTool::new("get_weather", "location", "Sunny in Tokyo.");
        let model = Arc::new(ScriptedModel::new([
            r#"{"type":"tool","action":"get_weather","input":{"location":"Tokyo"}}"#,
            "Sunny in Tokyo today.",
        ]));
        let router = router_with(model, registry_with(&[weather.clone()]), store);

        router
            .handle_turn("u1", "what is the weather there in Tokyo")
            .await
            .unwrap();

        assert_eq!(
            weather.input(0).get("location").and_then(|v| v.as_str()),
            Some("Tokyo")
        );
    }

    #[tokio::test]
    async fn no_trigger_messages_never_route_to_tools() {
        let store = Arc::new(InMemoryStore::new());
        let weather = StubTool::new("get_weather", "location", "unused");
        let stocks = StubTool::new("get_stock_price", "ticker", "unused");
        let router = router_with(
            Arc::new(KeywordClassifier),
            registry_with(&[weather.clone(), stocks.clone()]),
            store,
        );

        for message in [
            "Tell me about the Eiffel Tower",
            "Is apple a fruit?",
            "Who wrote The Hobbit?",
        ] {
            let response = router.handle_turn("u1", message).await.unwrap();
            assert!(response.used_tool.is_none(), "{message:?} should not route");
            assert!(!response.answer.is_empty());
        }
        assert_eq!(weather.call_count(), 0);
        assert_eq!(stocks.call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_decision_degrades_to_a_direct_answer() {
        let store = Arc::new(InMemoryStore::new());
        let weather = StubTool::new("get_weather", "location", "unused");
        let model = Arc::new(ScriptedModel::new([
            "I refuse to emit JSON today",
            "Here is a plain answer.",
        ]));
        let router = router_with(model.clone(), registry_with(&[weather.clone()]), store);

        let response = router.handle_turn("u1", "hello?").await.unwrap();

        assert_eq!(response.answer, "Here is a plain answer.");
        assert!(response.used_tool.is_none());
        assert!(response.tool_latency_ms.is_none());
        assert_eq!(weather.call_count(), 0);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn unknown_action_degrades_to_a_direct_answer() {
        let store = Arc::new(InMemoryStore::new());
        let weather = StubTool::new("get_weather", "location", "unused");
        let model = Arc::new(ScriptedModel::new([
            r#"{"type":"tool","action":"get_forecast","input":{"location":"Paris"}}"#,
            "I can't fetch forecasts, but here is what I know.",
        ]));
        let router = router_with(model, registry_with(&[weather.clone()]), store);

        let response = router.handle_turn("u1", "forecast for Paris?").await.unwrap();

        assert_eq!(response.answer, "I can't fetch forecasts, but here is what I know.");
        assert!(response.used_tool.is_none());
        assert_eq!(weather.call_count(), 0);
    }

    #[tokio::test]
    async fn proposed_final_answers_are_recomposed() {
        let store = Arc::new(InMemoryStore::new());
        let model = Arc::new(ScriptedModel::new([
            r#"{"type":"final","answer":"the classifier's own words"}"#,
            "the composer's words",
        ]));
        let router = router_with(model, ToolRegistry::new(), store);

        let response = router.handle_turn("u1", "say something").await.unwrap();
        assert_eq!(response.answer, "the composer's words");
    }

    #[tokio::test]
    async fn direct_answers_see_prior_turn_context() {
        let store = Arc::new(InMemoryStore::new());
        let model = Arc::new(ScriptedModel::new([
            r#"{"type":"final","answer":"ignored"}"#,
            "Crabs are crustaceans.",
            r#"{"type":"final","answer":"ignored"}"#,
            "As I said, crustaceans.",
        ]));
        let router = router_with(model.clone(), ToolRegistry::new(), store);

        router.handle_turn("u1", "Tell me about crabs").await.unwrap();
        router.handle_turn("u1", "more about crabs please").await.unwrap();

        let second_compose = model.request(3);
        assert!(second_compose.messages[1].content.contains("Relevant prior context:"));
        assert!(
            second_compose.messages[1]
                .content
                .contains("user: Tell me about crabs")
        );
    }

    #[tokio::test]
    async fn tool_failures_surface_as_turn_errors() {
        let store = Arc::new(InMemoryStore::new());
        let failing = StubTool::failing("get_weather", "location");
        let model = Arc::new(ScriptedModel::new([WEATHER_DECISION]));
        let router = router_with(model, registry_with(&[failing]), store.clone());

        let err = router
            .handle_turn("u1", "What's the weather in Paris?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool(_)));

        // a failed turn leaves no transcript behind
        assert!(store.recent_messages("u1", 10).await.unwrap().is_empty());
    }
}
