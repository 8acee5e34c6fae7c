//! # Switchboard Core
//!
//! Domain types, traits, and error definitions for the switchboard
//! conversational request router. This crate defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is a trait here: the language model
//! ([`ChatModel`]), durable per-user state ([`SlotStore`]), and the tool
//! capability contract ([`Tool`]). Implementations live in their respective
//! crates, are constructed once at process start, and are passed explicitly
//! into the turn engine. No process-global singletons.

pub mod error;
pub mod llm;
pub mod memory;
pub mod routing;
pub mod tool;
pub mod transcript;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, LlmError, MemoryError, Result, ToolError};
pub use llm::{ChatCompletion, ChatMessage, ChatModel, ChatRequest, ChatRole, Usage};
pub use memory::{META_NAMESPACE, SlotStore, default_freshness};
pub use routing::RoutingDecision;
pub use tool::{InputSchema, Tool, ToolInput, ToolRegistry};
pub use transcript::{Role, TranscriptEntry};
pub use turn::{TurnRequest, TurnResponse};
