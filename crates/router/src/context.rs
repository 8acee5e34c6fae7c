//! Follow-up detection, slot backfill, and snippet selection.
//!
//! The resolver is the bridge between raw utterances and tool execution:
//! it decides when a message is leaning on prior turns, fills missing tool
//! slots from remembered values, and picks the transcript snippets worth
//! showing the composer. It owns no policy about WHICH tools exist; schema
//! keys drive everything.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use switchboard_core::error::MemoryError;
use switchboard_core::memory::{META_NAMESPACE, SlotStore, default_freshness};
use switchboard_core::tool::{InputSchema, ToolInput};
use switchboard_core::transcript::Role;
use switchboard_memory::IndexCache;
use tracing::debug;

/// Cue words that mark a message as referring back to earlier turns.
/// Matched case-insensitively at word boundaries, so "therefore" is not
/// a follow-up but "what about it" is.
const FOLLOWUP_CUES: &str =
    r"(?i)\b(?:there|here|that|those|them|it|same|again|previous|earlier)\b";

/// Slot key under [`META_NAMESPACE`] recording the most recent tool a user ran.
const LAST_TOOL_KEY: &str = "last_tool";

pub struct ContextResolver {
    store: Arc<dyn SlotStore>,
    indexes: IndexCache,
    followup: Regex,
}

impl ContextResolver {
    pub fn new(store: Arc<dyn SlotStore>, indexes: IndexCache) -> Self {
        Self {
            store,
            indexes,
            followup: Regex::new(FOLLOWUP_CUES).expect("follow-up cue pattern is valid"),
        }
    }

    /// Add one transcript line to the user's ephemeral snippet index.
    pub fn index_message(&self, user_id: &str, role: Role, content: &str) {
        self.indexes.add(user_id, [format!("{role}: {content}")]);
    }

    /// Whether the message leans on prior conversation context.
    pub fn is_followup(&self, text: &str) -> bool {
        self.followup.is_match(text)
    }

    /// Fill missing tool slots from remembered values.
    ///
    /// Starts from the classifier-proposed input. For each schema key that is
    /// absent, null, or blank, and only when the message is a follow-up, the
    /// freshest remembered value under the tool's namespace is filled in.
    /// Values the classifier provided are never overwritten; slots with no
    /// remembered value stay absent.
    pub async fn resolve_tool_inputs(
        &self,
        user_id: &str,
        tool_name: &str,
        input: ToolInput,
        schema: &InputSchema,
        user_text: &str,
    ) -> Result<ToolInput, MemoryError> {
        let mut resolved = input;
        if !self.is_followup(user_text) {
            return Ok(resolved);
        }

        for key in schema.keys() {
            if slot_provided(resolved.get(key)) {
                continue;
            }
            let remembered = self
                .store
                .get_slot(user_id, tool_name, key, Some(default_freshness()))
                .await?;
            if let Some(value) = remembered {
                debug!(user_id, tool = tool_name, slot = %key, "Backfilled slot from memory");
                resolved.insert(key.clone(), Value::String(value));
            }
        }
        Ok(resolved)
    }

    /// Remember the slots a tool actually ran with, so later follow-ups can
    /// reuse them. Only non-blank strings and numbers are kept. Also records
    /// the tool as the user's most recent one.
    pub async fn persist_tool_memory(
        &self,
        user_id: &str,
        tool_name: &str,
        input: &ToolInput,
    ) -> Result<(), MemoryError> {
        for (key, value) in input {
            let text = match value {
                Value::String(s) if !s.trim().is_empty() => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            self.store.set_slot(user_id, tool_name, key, &text).await?;
        }
        self.store
            .set_slot(user_id, META_NAMESPACE, LAST_TOOL_KEY, tool_name)
            .await
    }

    /// Whether prior-turn snippets belong in the tool-polish prompt: the
    /// message must be a follow-up AND the user's freshest remembered tool
    /// must be this one.
    pub async fn should_include_history(
        &self,
        user_id: &str,
        tool_name: &str,
        user_text: &str,
    ) -> Result<bool, MemoryError> {
        if !self.is_followup(user_text) {
            return Ok(false);
        }
        let last = self
            .store
            .get_slot(user_id, META_NAMESPACE, LAST_TOOL_KEY, Some(default_freshness()))
            .await?;
        Ok(last.as_deref() == Some(tool_name))
    }

    /// Up to `k` prior snippets relevant to the query. Retrieval failures
    /// degrade to no snippets; an answer without context beats no answer.
    pub fn select_snippets(&self, user_id: &str, query: &str, k: usize) -> Vec<String> {
        match self.indexes.search(user_id, query, k) {
            Ok(snippets) => snippets,
            Err(err) => {
                debug!(user_id, error = %err, "Snippet retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    /// Drop the user's snippet index.
    pub fn reset(&self, user_id: &str) {
        self.indexes.reset(user_id);
    }
}

/// A slot counts as provided unless it is absent, null, or a blank string.
fn slot_provided(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
