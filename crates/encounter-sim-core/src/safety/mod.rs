//! Safety and handoff gate.
//!
//! Evaluates red-flag rules over observed state, detects dangerous misses,
//! and decides whether to defer to a human. Any doubt about correctness
//! resolves toward handoff rather than asserting a diagnosis.

mod rules;

pub use rules::{RedFlagRule, RedFlagTrigger, RED_FLAG_RULES};

use serde::{Deserialize, Serialize};

use crate::engine::INSUFFICIENT_EVIDENCE;
use crate::models::{ObservedState, Urgency};

const NOTICE_EMERGENCY: &str = "Red-flag rules fired: possible critical illness. Arrange emergency care immediately; this system is assistive only.";
const NOTICE_HIGH_URGENCY: &str = "High-risk presentation: this system is decision support only. Contact an emergency physician now.";
const NOTICE_DEFAULT: &str = "This system is a decision-support aid; a licensed clinician must confirm the final plan.";

/// Output of [`SafetyGate::evaluate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyAssessment {
    pub notice: String,
    pub emergency: bool,
    pub red_flags: Vec<String>,
    pub dangerous_miss: bool,
}

/// Output of [`SafetyGate::handoff_decision`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoffDecision {
    pub escalate: bool,
    pub refuse: bool,
    /// First matching condition's description; empty when not refusing
    pub reason: String,
}

impl HandoffDecision {
    fn proceed() -> Self {
        Self {
            escalate: false,
            refuse: false,
            reason: String::new(),
        }
    }

    fn handoff(reason: String) -> Self {
        Self {
            escalate: true,
            refuse: true,
            reason,
        }
    }
}

/// Red-flag evaluation and escalate/refuse determination.
#[derive(Debug, Clone, Copy)]
pub struct SafetyGate {
    min_confidence: f64,
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl SafetyGate {
    /// `min_confidence` is the refusal threshold in [0, 1].
    pub fn new(min_confidence: f64) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    /// Keyword-driven urgency: certain symptom combinations force high,
    /// everything else is medium.
    pub fn assess_triage(&self, state: &ObservedState) -> Urgency {
        let symptoms = state.symptom_text();
        if symptoms.contains("chest pain")
            || symptoms.contains("tachypnea")
            || symptoms.contains("shortness of breath")
        {
            return Urgency::High;
        }
        if symptoms.contains("slurred speech") || symptoms.contains("weakness") {
            return Urgency::High;
        }
        Urgency::Medium
    }

    /// Evaluate every red-flag rule and derive the emergency and
    /// dangerous-miss flags for the current diagnosis.
    pub fn evaluate(
        &self,
        state: &ObservedState,
        diagnosis: &str,
        urgency: Urgency,
    ) -> SafetyAssessment {
        let diagnosis_lower = diagnosis.to_lowercase();
        let mut red_flags = Vec::new();
        let mut dangerous_miss = false;

        for rule in RED_FLAG_RULES {
            if !rule.fires(state) {
                continue;
            }
            red_flags.push(rule.name.to_string());
            if let Some(marker) = rule.critical_diagnosis_marker {
                if !diagnosis_lower.contains(marker) {
                    dangerous_miss = true;
                }
            }
        }

        let emergency = !red_flags.is_empty();
        let notice = if emergency {
            NOTICE_EMERGENCY
        } else if urgency == Urgency::High {
            NOTICE_HIGH_URGENCY
        } else {
            NOTICE_DEFAULT
        };

        SafetyAssessment {
            notice: notice.into(),
            emergency,
            red_flags,
            dangerous_miss,
        }
    }

    /// Escalate/refuse when any handoff condition holds, reporting the first
    /// matching condition in priority order.
    pub fn handoff_decision(
        &self,
        diagnosis: &str,
        emergency: bool,
        dangerous_miss: bool,
        confidence: f64,
    ) -> HandoffDecision {
        if emergency {
            return HandoffDecision::handoff(
                "red-flag emergency pattern detected; defer to emergency care".into(),
            );
        }
        if dangerous_miss {
            return HandoffDecision::handoff(
                "possible dangerous miss: a critical pattern is not covered by the working diagnosis"
                    .into(),
            );
        }
        if diagnosis == INSUFFICIENT_EVIDENCE {
            return HandoffDecision::handoff(
                "evidence is insufficient to support a diagnosis".into(),
            );
        }
        if confidence < self.min_confidence {
            return HandoffDecision::handoff(format!(
                "diagnostic confidence {confidence:.3} is below the {:.2} threshold",
                self.min_confidence
            ));
        }
        HandoffDecision::proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientCase;

    fn state(symptoms: &[&str]) -> ObservedState {
        let mut case = PatientCase::new("t".into(), "dx".into());
        case.symptoms = symptoms.iter().map(|s| s.to_string()).collect();
        ObservedState::for_case(&case)
    }

    #[test]
    fn test_triage_rules() {
        let gate = SafetyGate::default();
        assert_eq!(gate.assess_triage(&state(&["chest pain"])), Urgency::High);
        assert_eq!(
            gate.assess_triage(&state(&["slurred speech"])),
            Urgency::High
        );
        assert_eq!(
            gate.assess_triage(&state(&["fever", "cough"])),
            Urgency::Medium
        );
    }

    #[test]
    fn test_all_rules_evaluated_not_first_match() {
        let gate = SafetyGate::default();
        let mut s = state(&["chest pain", "diaphoresis"]);
        s.completed_tests
            .insert("ecg".into(), "ST elevation in II, III, aVF".into());
        s.completed_tests
            .insert("troponin".into(), "Troponin I elevated".into());

        let assessment = gate.evaluate(&s, "acute inferior myocardial infarction", Urgency::High);
        assert!(assessment.emergency);
        assert_eq!(assessment.red_flags.len(), 3);
        assert!(!assessment.dangerous_miss);
        assert_eq!(assessment.notice, NOTICE_EMERGENCY);
    }

    #[test]
    fn test_dangerous_miss_when_diagnosis_outside_category() {
        let gate = SafetyGate::default();
        let s = state(&["chest pain", "tachypnea"]);

        let missed = gate.evaluate(&s, INSUFFICIENT_EVIDENCE, Urgency::High);
        assert!(missed.emergency);
        assert!(missed.dangerous_miss);

        let covered = gate.evaluate(&s, "acute inferior myocardial infarction", Urgency::High);
        assert!(!covered.dangerous_miss);
    }

    #[test]
    fn test_notice_priority() {
        let gate = SafetyGate::default();
        let calm = state(&["fever", "cough"]);
        assert_eq!(
            gate.evaluate(&calm, "community-acquired pneumonia", Urgency::Medium)
                .notice,
            NOTICE_DEFAULT
        );
        assert_eq!(
            gate.evaluate(&calm, "community-acquired pneumonia", Urgency::High)
                .notice,
            NOTICE_HIGH_URGENCY
        );
    }

    #[test]
    fn test_handoff_priority_order() {
        let gate = SafetyGate::default();

        let emergency = gate.handoff_decision("anything", true, true, 0.9);
        assert!(emergency.escalate && emergency.refuse);
        assert!(emergency.reason.contains("red-flag"));

        let miss = gate.handoff_decision("anything", false, true, 0.9);
        assert!(miss.reason.contains("dangerous miss"));

        let sentinel = gate.handoff_decision(INSUFFICIENT_EVIDENCE, false, false, 0.9);
        assert!(sentinel.reason.contains("insufficient"));

        let low = gate.handoff_decision("acute appendicitis", false, false, 0.3);
        assert!(low.reason.contains("below"));

        let ok = gate.handoff_decision("acute appendicitis", false, false, 0.8);
        assert!(!ok.escalate && !ok.refuse);
        assert!(ok.reason.is_empty());
    }

    #[test]
    fn test_threshold_configurable() {
        let strict = SafetyGate::new(0.9);
        assert!(strict
            .handoff_decision("acute appendicitis", false, false, 0.8)
            .refuse);
        let lenient = SafetyGate::new(0.1);
        assert!(!lenient
            .handoff_decision("acute appendicitis", false, false, 0.2)
            .refuse);
    }
}
