//! Turn routing for Switchboard.
//!
//! One turn runs classify → resolve → execute → compose:
//! the classifier decides between a tool call and a direct answer, the
//! context resolver backfills missing tool slots from per-user memory,
//! and the composer turns the raw result into a short user-facing answer.
//! [`TurnRouter`] wires the pieces together; [`eval`] scores routing
//! accuracy against YAML case files.

pub mod classify;
pub mod compose;
pub mod context;
pub mod engine;
pub mod eval;
pub mod prompts;

pub use classify::{RouteClassification, classify};
pub use compose::{Composed, answer_directly, polish_tool_answer};
pub use context::ContextResolver;
pub use engine::TurnRouter;
pub use eval::{CaseResult, EvalCase, EvalReport, EvalSummary, parse_cases, run_eval};

#[cfg(test)]
pub(crate) mod test_helpers;
