//! Actions against the world model and their results.

use serde::{Deserialize, Serialize};

/// Tag identifying an action or result kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AskQuestion,
    OrderTest,
    RecommendPlan,
}

impl ActionKind {
    /// Stable wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::AskQuestion => "ask_question",
            ActionKind::OrderTest => "order_test",
            ActionKind::RecommendPlan => "recommend_plan",
        }
    }
}

/// A tagged request against the world model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Ask the patient a scripted question by key.
    AskQuestion { question: String },
    /// Order a test from the case's test map.
    OrderTest { test: String },
    /// Propose a candidate diagnosis for consistency feedback.
    RecommendPlan { diagnosis: String },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AskQuestion { .. } => ActionKind::AskQuestion,
            Action::OrderTest { .. } => ActionKind::OrderTest,
            Action::RecommendPlan { .. } => ActionKind::RecommendPlan,
        }
    }
}

/// Observation returned by the world model for one action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    /// Tag matching the action
    pub kind: ActionKind,
    /// Observation text (canonical or noise-substituted)
    pub observation: String,
    /// Whether the observation was noise-substituted
    pub noisy: bool,
    /// Available test names; populated for order-test results, empty otherwise
    pub available_tests: Vec<String>,
}

impl ActionResult {
    /// Result with no metadata beyond the observation.
    pub fn plain(kind: ActionKind, observation: impl Into<String>) -> Self {
        Self {
            kind,
            observation: observation.into(),
            noisy: false,
            available_tests: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_round_trip() {
        let action = Action::OrderTest { test: "ecg".into() };
        assert_eq!(action.kind(), ActionKind::OrderTest);
        assert_eq!(action.kind().as_str(), "order_test");

        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"kind\":\"order_test\""));
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
