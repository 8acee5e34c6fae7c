//! Tool trait: the closed capability contract behind routing.
//!
//! The action vocabulary is small and known ahead of time, so the contract
//! is deliberately narrow: a name the classifier emits, a description, a
//! flat slot schema, and an async run that returns display text. Soft
//! failures (missing input, lookup miss, absent credential) come back as
//! `Ok` explanatory text so the composer can relay them; only transport
//! problems are `Err`.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::error::ToolError;

/// Tool input: a JSON object, slot name to value.
pub type ToolInput = serde_json::Map<String, serde_json::Value>;

/// Slot name → human-readable hint. The KEYS drive slot backfill; the
/// hints are prompt and display material only.
pub type InputSchema = BTreeMap<String, String>;

#[async_trait]
pub trait Tool: Send + Sync {
    /// The action string the classifier emits (e.g. "get_weather").
    fn name(&self) -> &str;

    /// One-line capability summary.
    fn description(&self) -> &str;

    /// The slots this tool understands.
    fn input_schema(&self) -> InputSchema;

    /// Run with a resolved input object, producing human-readable text.
    async fn run(&self, input: &ToolInput) -> Result<String, ToolError>;
}

/// Name → tool. Registration replaces any existing tool with the same name.
///
/// A routing decision naming an unknown action is NOT looked up through an
/// error path here; the router checks `get` and degrades to a direct
/// answer on a miss.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Registered action names, sorted for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
