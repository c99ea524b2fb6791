//! Diagnostic decision engine.
//!
//! A pure function of observed state and free-text intent: pick the next
//! action, infer a diagnosis from accumulated evidence, and score confidence.
//! No search; everything is a table lookup over [`clusters::CLUSTERS`].

mod clusters;

pub use clusters::{
    ClusterSpec, EvidenceRule, PathwayStep, SymptomMatch, GATHER_EVIDENCE_PLAN,
    INSUFFICIENT_EVIDENCE,
};

use serde::{Deserialize, Serialize};

use crate::models::{Action, ObservedState};

/// Phrases in the caller's free text that request a summary/recommendation.
const RECOMMEND_KEYWORDS: &[&str] = &["recommend", "advise", "summar", "diagnosis", "建议", "总结"];

/// Question key probed when no cluster matches the symptoms.
const GENERIC_PROBE: &str = "onset";

/// Confidence blend weights and bases; the guideline share comes from the
/// retriever's top-hit confidence.
const CONFIDENCE_BASE_WEIGHT: f64 = 0.7;
const CONFIDENCE_GUIDELINE_WEIGHT: f64 = 0.3;
const BASE_EVIDENCE_SATISFIED: f64 = 0.85;
const BASE_INTERMEDIATE: f64 = 0.55;
const BASE_SENTINEL: f64 = 0.2;

/// Deterministic decision-tree engine over the cluster table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Choose the next action for this state and caller message.
    pub fn choose_action(&self, state: &ObservedState, user_message: &str) -> Action {
        let message = user_message.to_lowercase();
        if RECOMMEND_KEYWORDS.iter().any(|k| message.contains(k)) {
            return Action::RecommendPlan {
                diagnosis: self.infer_diagnosis(state),
            };
        }

        let Some(cluster) = clusters::match_cluster(state) else {
            return Action::AskQuestion {
                question: GENERIC_PROBE.into(),
            };
        };

        let evidence_done = cluster.evidence_satisfied(state);
        for step in cluster.pathway {
            if step.unless_evidence && evidence_done {
                continue;
            }
            if !state.completed_tests.contains_key(step.test) {
                return Action::OrderTest {
                    test: step.test.into(),
                };
            }
        }

        Action::RecommendPlan {
            diagnosis: self.infer_diagnosis(state),
        }
    }

    /// First cluster (in priority order) whose evidence predicate is
    /// satisfied, else the sentinel label.
    pub fn infer_diagnosis(&self, state: &ObservedState) -> String {
        clusters::CLUSTERS
            .iter()
            .find(|c| c.evidence_satisfied(state))
            .map(|c| c.diagnosis.to_string())
            .unwrap_or_else(|| INSUFFICIENT_EVIDENCE.to_string())
    }

    /// Fixed recommendation text for a diagnosis label.
    pub fn treatment_plan(&self, diagnosis: &str) -> String {
        clusters::cluster_for_diagnosis(diagnosis)
            .map(|c| c.treatment.to_string())
            .unwrap_or_else(|| GATHER_EVIDENCE_PLAN.to_string())
    }

    /// Completed-test facts that satisfied the winning predicate; empty for
    /// the sentinel label.
    pub fn build_evidence_chain(&self, state: &ObservedState, diagnosis: &str) -> Vec<String> {
        let Some(cluster) = clusters::cluster_for_diagnosis(diagnosis) else {
            return Vec::new();
        };
        if !cluster.evidence_satisfied(state) {
            return Vec::new();
        }
        cluster
            .evidence
            .iter()
            .filter_map(|rule| {
                state
                    .completed_tests
                    .get(rule.test)
                    .map(|observed| format!("{}: {}", rule.test, observed))
            })
            .collect()
    }

    /// Blend of evidence strength and guideline support, clamped to [0, 1].
    pub fn estimate_confidence(
        &self,
        state: &ObservedState,
        diagnosis: &str,
        guideline_confidence: f64,
    ) -> f64 {
        let base = match clusters::cluster_for_diagnosis(diagnosis) {
            None => BASE_SENTINEL,
            Some(cluster) if cluster.evidence_satisfied(state) => BASE_EVIDENCE_SATISFIED,
            Some(_) => BASE_INTERMEDIATE,
        };
        let blended = CONFIDENCE_BASE_WEIGHT * base
            + CONFIDENCE_GUIDELINE_WEIGHT * guideline_confidence.clamp(0.0, 1.0);
        blended.clamp(0.0, 1.0)
    }

    /// Workup progress against the matched cluster's pathway.
    pub fn pathway_progress(&self, state: &ObservedState) -> PathwayProgress {
        let Some(cluster) = clusters::match_cluster(state) else {
            return PathwayProgress {
                case_id: state.case_id.clone(),
                cluster: None,
                total_steps: 0,
                completed: Vec::new(),
                pending: Vec::new(),
                progress: 0.0,
            };
        };

        let mut completed = Vec::new();
        let mut pending = Vec::new();
        for step in cluster.pathway {
            if state.completed_tests.contains_key(step.test) {
                completed.push(step.test.to_string());
            } else {
                pending.push(step.test.to_string());
            }
        }
        let total = cluster.pathway.len();
        let progress = completed.len() as f64 / total.max(1) as f64;

        PathwayProgress {
            case_id: state.case_id.clone(),
            cluster: Some(cluster.name.to_string()),
            total_steps: total,
            completed,
            pending,
            progress: (progress * 1000.0).round() / 1000.0,
        }
    }
}

/// Snapshot of workup progress for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathwayProgress {
    pub case_id: String,
    /// Matched cluster name, or `None` when no cluster applies
    pub cluster: Option<String>,
    pub total_steps: usize,
    pub completed: Vec<String>,
    pub pending: Vec<String>,
    /// Fraction of pathway steps completed, rounded to 3 decimals
    pub progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientCase;

    fn chest_pain_state() -> ObservedState {
        let mut case = PatientCase::new("chest_pain_001".into(), "mi".into());
        case.symptoms = vec!["chest pain".into(), "tachypnea".into(), "diaphoresis".into()];
        ObservedState::for_case(&case)
    }

    fn with_acs_evidence(state: &mut ObservedState) {
        state
            .completed_tests
            .insert("ecg".into(), "ST elevation in II, III, aVF".into());
        state
            .completed_tests
            .insert("troponin".into(), "Troponin I elevated at 2.3 ng/mL".into());
    }

    #[test]
    fn test_choose_action_walks_pathway() {
        let engine = DecisionEngine::new();
        let mut state = chest_pain_state();

        assert_eq!(
            engine.choose_action(&state, "please proceed"),
            Action::OrderTest { test: "ecg".into() }
        );

        state
            .completed_tests
            .insert("ecg".into(), "ST elevation".into());
        assert_eq!(
            engine.choose_action(&state, "continue"),
            Action::OrderTest { test: "troponin".into() }
        );
    }

    #[test]
    fn test_conditional_step_skipped_once_evidence_satisfied() {
        let engine = DecisionEngine::new();
        let mut state = chest_pain_state();
        with_acs_evidence(&mut state);

        // chest_xray is an if-inconclusive step; with full evidence the
        // engine goes straight to a recommendation.
        match engine.choose_action(&state, "continue") {
            Action::RecommendPlan { diagnosis } => {
                assert_eq!(diagnosis, "acute inferior myocardial infarction")
            }
            other => panic!("expected recommend_plan, got {other:?}"),
        }
    }

    #[test]
    fn test_conditional_step_ordered_when_inconclusive() {
        let engine = DecisionEngine::new();
        let mut state = chest_pain_state();
        state
            .completed_tests
            .insert("ecg".into(), "Nonspecific changes".into());
        state
            .completed_tests
            .insert("troponin".into(), "Troponin within reference".into());

        assert_eq!(
            engine.choose_action(&state, "continue"),
            Action::OrderTest { test: "chest_xray".into() }
        );
    }

    #[test]
    fn test_recommend_keyword_short_circuits() {
        let engine = DecisionEngine::new();
        let state = chest_pain_state();
        match engine.choose_action(&state, "Please advise on next steps") {
            Action::RecommendPlan { diagnosis } => {
                assert_eq!(diagnosis, INSUFFICIENT_EVIDENCE)
            }
            other => panic!("expected recommend_plan, got {other:?}"),
        }
    }

    #[test]
    fn test_no_cluster_asks_generic_probe() {
        let engine = DecisionEngine::new();
        let mut case = PatientCase::new("c".into(), "dx".into());
        case.symptoms = vec!["fatigue".into()];
        let state = ObservedState::for_case(&case);

        assert_eq!(
            engine.choose_action(&state, "go on"),
            Action::AskQuestion { question: "onset".into() }
        );
    }

    #[test]
    fn test_infer_diagnosis_and_evidence_chain() {
        let engine = DecisionEngine::new();
        let mut state = chest_pain_state();
        assert_eq!(engine.infer_diagnosis(&state), INSUFFICIENT_EVIDENCE);
        assert!(engine
            .build_evidence_chain(&state, INSUFFICIENT_EVIDENCE)
            .is_empty());

        with_acs_evidence(&mut state);
        let diagnosis = engine.infer_diagnosis(&state);
        assert_eq!(diagnosis, "acute inferior myocardial infarction");

        let chain = engine.build_evidence_chain(&state, &diagnosis);
        assert_eq!(chain.len(), 2);
        assert!(chain[0].starts_with("ecg:"));
        assert!(chain[1].starts_with("troponin:"));
    }

    #[test]
    fn test_treatment_plan_lookup() {
        let engine = DecisionEngine::new();
        assert!(engine
            .treatment_plan("community-acquired pneumonia")
            .contains("antimicrobial"));
        assert_eq!(
            engine.treatment_plan(INSUFFICIENT_EVIDENCE),
            GATHER_EVIDENCE_PLAN
        );
    }

    #[test]
    fn test_confidence_blend() {
        let engine = DecisionEngine::new();
        let mut state = chest_pain_state();

        let low = engine.estimate_confidence(&state, INSUFFICIENT_EVIDENCE, 0.0);
        assert!((low - 0.14).abs() < 1e-9);

        with_acs_evidence(&mut state);
        let high =
            engine.estimate_confidence(&state, "acute inferior myocardial infarction", 1.0);
        assert!((high - 0.895).abs() < 1e-9);
        assert!(high <= 1.0);

        // Guideline signal outside [0,1] is clamped before blending.
        let clamped =
            engine.estimate_confidence(&state, "acute inferior myocardial infarction", 7.0);
        assert!((clamped - 0.895).abs() < 1e-9);
    }

    #[test]
    fn test_pathway_progress() {
        let engine = DecisionEngine::new();
        let mut state = chest_pain_state();
        let progress = engine.pathway_progress(&state);
        assert_eq!(progress.cluster.as_deref(), Some("cardiac"));
        assert_eq!(progress.total_steps, 3);
        assert!(progress.completed.is_empty());

        state
            .completed_tests
            .insert("ecg".into(), "ST elevation".into());
        let progress = engine.pathway_progress(&state);
        assert_eq!(progress.completed, vec!["ecg"]);
        assert!((progress.progress - 0.333).abs() < 1e-9);
    }
}
