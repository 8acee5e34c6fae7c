//! Shared test helpers for router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use switchboard_core::error::{LlmError, ToolError};
use switchboard_core::llm::{ChatCompletion, ChatModel, ChatRequest};
use switchboard_core::tool::{InputSchema, Tool, ToolInput};

use crate::prompts::ROUTER_SYSTEM;

/// A model that returns a fixed sequence of scripted replies.
///
/// Each call to `complete` consumes the next reply and logs the request
/// for later inspection. Panics when more calls arrive than replies were
/// scripted.
pub(crate) struct ScriptedModel {
    replies: Mutex<Vec<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The i-th request seen, panicking when out of range.
    pub(crate) fn request(&self, i: usize) -> ChatRequest {
        self.requests.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let call_number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            panic!("ScriptedModel: no reply scripted for call #{call_number}");
        }
        Ok(ChatCompletion {
            content: replies.remove(0),
            model: "scripted".into(),
            usage: None,
        })
    }
}

/// A deterministic classifier stand-in: keyword routing for classification
/// requests, prompt echo for everything else.
pub(crate) struct KeywordClassifier;

#[async_trait]
impl ChatModel for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword-classifier"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let system = request
            .messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let content = if system == ROUTER_SYSTEM {
            let lower = prompt.to_lowercase();
            if lower.contains("weather") {
                r#"{"type":"tool","action":"get_weather","input":{"location":"Paris"}}"#.to_string()
            } else if lower.contains("stock") || lower.contains("price") {
                r#"{"type":"tool","action":"get_stock_price","input":{"ticker":"AAPL"}}"#.to_string()
            } else {
                r#"{"type":"final","answer":"no tool needed"}"#.to_string()
            }
        } else {
            // echo so substring assertions can see exactly what was composed
            prompt.to_string()
        };

        Ok(ChatCompletion {
            content,
            model: "keyword-classifier".into(),
            usage: None,
        })
    }
}

struct StubInner {
    name: String,
    schema: InputSchema,
    reply: String,
    fail: bool,
    calls: Mutex<Vec<ToolInput>>,
}

/// A tool that records every input and returns a canned reply. Clones share
/// state, so tests can keep a handle after registering one.
#[derive(Clone)]
pub(crate) struct StubTool {
    inner: Arc<StubInner>,
}

impl StubTool {
    pub(crate) fn new(name: &str, slot: &str, reply: &str) -> Self {
        Self {
            inner: Arc::new(StubInner {
                name: name.to_string(),
                schema: InputSchema::from([(slot.to_string(), format!("{slot} to use"))]),
                reply: reply.to_string(),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A stub whose every run fails like a transport error would.
    pub(crate) fn failing(name: &str, slot: &str) -> Self {
        let mut stub = Self::new(name, slot, "");
        Arc::get_mut(&mut stub.inner)
            .expect("stub not yet shared")
            .fail = true;
        stub
    }

    pub(crate) fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }

    /// The i-th input seen, panicking when out of range.
    pub(crate) fn input(&self, i: usize) -> ToolInput {
        self.inner.calls.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn description(&self) -> &str {
        "canned reply for tests"
    }

    fn input_schema(&self) -> InputSchema {
        self.inner.schema.clone()
    }

    async fn run(&self, input: &ToolInput) -> Result<String, ToolError> {
        self.inner.calls.lock().unwrap().push(input.clone());
        if self.inner.fail {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.inner.name.clone(),
                reason: "stubbed transport failure".into(),
            });
        }
        Ok(self.inner.reply.clone())
    }
}
