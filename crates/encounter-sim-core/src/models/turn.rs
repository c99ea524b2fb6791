//! Composed result of one chat turn.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Action, ActionResult};

/// Triage urgency for the presentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::High => write!(f, "high"),
            Urgency::Medium => write!(f, "medium"),
        }
    }
}

/// Everything the pipeline produced for a single turn, appended to the
/// session history in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnResult {
    /// Human-readable summary composed from the fields below
    pub message: String,
    /// Action the decision engine chose
    pub action: Action,
    /// World model's observation for that action
    pub result: ActionResult,
    /// Inferred diagnosis label, or the insufficient-evidence sentinel
    pub diagnosis: String,
    /// Treatment recommendation text
    pub recommendation: String,
    /// Triage urgency
    pub urgency: Urgency,
    /// Safety notice text selected by the gate
    pub safety_notice: String,
    /// Whether any red-flag rule fired
    pub emergency: bool,
    /// Names of the red-flag rules that fired
    pub red_flags: Vec<String>,
    /// A critical-category red flag fired outside the inferred diagnosis
    pub dangerous_miss: bool,
    /// Guideline citations supporting the diagnosis
    pub guideline_refs: Vec<String>,
    /// Ordered facts justifying the inferred diagnosis
    pub evidence_chain: Vec<String>,
    /// Diagnosis confidence in [0, 1]
    pub diagnosis_confidence: f64,
    /// Whether the gate defers to a human
    pub escalate_to_human: bool,
    /// Whether the system refuses to assert the diagnosis
    pub refusal: bool,
    /// First matching handoff condition, empty when not refusing
    pub refusal_reason: String,
}
