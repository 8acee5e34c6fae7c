//! YAML-driven routing evaluation.
//!
//! Cases score two things: did the classifier pick the expected action, and
//! (optionally) does the full turn's answer contain an expected substring.
//! Route scoring needs only a classification call; the substring check runs
//! the complete turn, tools included.

use serde::{Deserialize, Serialize};
use switchboard_core::error::Error;
use switchboard_core::routing::RoutingDecision;

use crate::engine::TurnRouter;

/// User id under which full-turn checks run.
const EVAL_USER: &str = "eval";

/// One evaluation case as written in the YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalCase {
    pub id: String,
    pub question: String,
    /// Accepted action name(s); "none" means a direct answer is expected.
    #[serde(default = "default_expect_action")]
    pub expect_action: ExpectAction,
    /// Substring the final answer must contain (case-insensitive).
    #[serde(default)]
    pub expect_contains: Option<String>,
}

fn default_expect_action() -> ExpectAction {
    ExpectAction::One("none".to_string())
}

/// A single expected action or any of several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpectAction {
    One(String),
    Any(Vec<String>),
}

impl ExpectAction {
    pub fn as_list(&self) -> Vec<String> {
        let list = match self {
            ExpectAction::One(action) => vec![action.clone()],
            ExpectAction::Any(actions) => actions.clone(),
        };
        if list.is_empty() {
            vec!["none".to_string()]
        } else {
            list
        }
    }
}

/// Scored outcome for one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: String,
    pub question: String,
    pub predicted_action: String,
    pub expected: Vec<String>,
    pub route_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains_ok: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    pub total: usize,
    pub route_ok: usize,
    /// How many cases declared an `expect_contains` check.
    pub contains_checked: usize,
    pub contains_ok: usize,
    pub route_accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub results: Vec<CaseResult>,
    pub summary: EvalSummary,
}

/// Parse a YAML case file.
pub fn parse_cases(yaml: &str) -> Result<Vec<EvalCase>, Error> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Config {
        message: format!("invalid eval case file: {e}"),
    })
}

/// Run all cases against a router and score them.
pub async fn run_eval(router: &TurnRouter, cases: &[EvalCase]) -> Result<EvalReport, Error> {
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let decision = router.classify(&case.question).await?;
        let predicted_action = match &decision {
            RoutingDecision::Tool { action, .. } => action.clone(),
            RoutingDecision::Final { .. } => "none".to_string(),
        };
        let expected = case.expect_action.as_list();
        let route_ok = expected.iter().any(|e| e == &predicted_action);

        let mut used_tool = None;
        let mut contains_ok = None;
        if let Some(needle) = &case.expect_contains {
            let response = router.handle_turn(EVAL_USER, &case.question).await?;
            contains_ok = Some(
                response
                    .answer
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
            );
            used_tool = response.used_tool;
        }

        results.push(CaseResult {
            id: case.id.clone(),
            question: case.question.clone(),
            predicted_action,
            expected,
            route_ok,
            used_tool,
            expect_contains: case.expect_contains.clone(),
            contains_ok,
        });
    }

    let summary = summarize(&results);
    Ok(EvalReport { results, summary })
}

fn summarize(results: &[CaseResult]) -> EvalSummary {
    let total = results.len();
    let route_ok = results.iter().filter(|r| r.route_ok).count();
    let contains_checked = results.iter().filter(|r| r.contains_ok.is_some()).count();
    let contains_ok = results.iter().filter(|r| r.contains_ok == Some(true)).count();
    EvalSummary {
        total,
        route_ok,
        contains_checked,
        contains_ok,
        route_accuracy: if total == 0 {
            0.0
        } else {
            route_ok as f64 / total as f64
        },
    }
}
