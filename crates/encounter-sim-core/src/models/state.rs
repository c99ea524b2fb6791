//! Per-session observed state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PatientCase;

/// Mutable observed state for one session. Demographics and symptoms are
/// frozen copies taken at session start; known facts and completed tests grow
/// as the world model answers actions. Only the world model mutates this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedState {
    /// Owning case identifier
    pub case_id: String,
    /// Demographics copied from the case at session start
    pub demographics: BTreeMap<String, serde_json::Value>,
    /// Presenting symptoms copied from the case at session start
    pub symptoms: Vec<String>,
    /// Asked question key → observed answer
    pub known_facts: BTreeMap<String, String>,
    /// Ordered test name → observed result
    pub completed_tests: BTreeMap<String, String>,
    /// Append-only log of action tags
    pub history: Vec<String>,
}

impl ObservedState {
    /// Fresh observed state bound to a case.
    pub fn for_case(case: &PatientCase) -> Self {
        Self {
            case_id: case.case_id.clone(),
            demographics: case.demographics.clone(),
            symptoms: case.symptoms.clone(),
            known_facts: BTreeMap::new(),
            completed_tests: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Symptoms joined into one lowercase string for keyword checks.
    pub fn symptom_text(&self) -> String {
        self.symptoms.join(" ").to_lowercase()
    }

    /// Lowercased result text of a completed test, or empty if not done.
    pub fn test_text(&self, test: &str) -> String {
        self.completed_tests
            .get(test)
            .map(|t| t.to_lowercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_case_copies_and_starts_empty() {
        let mut case = PatientCase::new("c1".into(), "dx".into());
        case.symptoms = vec!["chest pain".into(), "diaphoresis".into()];
        case.tests.insert("ecg".into(), "ST elevation".into());

        let state = ObservedState::for_case(&case);
        assert_eq!(state.case_id, "c1");
        assert_eq!(state.symptoms.len(), 2);
        assert!(state.known_facts.is_empty());
        assert!(state.completed_tests.is_empty());
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_test_text_lowercases() {
        let case = PatientCase::new("c1".into(), "dx".into());
        let mut state = ObservedState::for_case(&case);
        state
            .completed_tests
            .insert("ecg".into(), "ST Elevation in II, III, aVF".into());

        assert!(state.test_text("ecg").contains("st elevation"));
        assert_eq!(state.test_text("troponin"), "");
    }
}
