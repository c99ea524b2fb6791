//! Ordered red-flag rule table.
//!
//! Every rule is evaluated independently on every pass; several flags can
//! and should fire together, so this is not a first-match dispatch.

use crate::models::ObservedState;

/// What makes a red-flag rule fire.
#[derive(Debug, Clone, Copy)]
pub enum RedFlagTrigger {
    /// A required symptom keyword together with at least one companion
    SymptomCombo {
        required: &'static str,
        with_any: &'static [&'static str],
    },
    /// A completed test whose text contains every marker
    TestMarkers {
        test: &'static str,
        markers: &'static [&'static str],
    },
}

/// One red-flag rule. Rules in a known-critical category carry the substring
/// the inferred diagnosis must contain for the flag to count as covered; a
/// categorized flag firing outside its diagnosis is a dangerous miss.
#[derive(Debug, Clone, Copy)]
pub struct RedFlagRule {
    pub name: &'static str,
    pub trigger: RedFlagTrigger,
    pub critical_diagnosis_marker: Option<&'static str>,
}

impl RedFlagRule {
    pub fn fires(&self, state: &ObservedState) -> bool {
        match self.trigger {
            RedFlagTrigger::SymptomCombo { required, with_any } => {
                let symptoms = state.symptom_text();
                symptoms.contains(required) && with_any.iter().any(|k| symptoms.contains(k))
            }
            RedFlagTrigger::TestMarkers { test, markers } => {
                let text = state.test_text(test);
                !text.is_empty() && markers.iter().all(|m| text.contains(m))
            }
        }
    }
}

pub const RED_FLAG_RULES: &[RedFlagRule] = &[
    RedFlagRule {
        name: "chest pain with tachypnea or diaphoresis",
        trigger: RedFlagTrigger::SymptomCombo {
            required: "chest pain",
            with_any: &["tachypnea", "diaphoresis", "shortness of breath"],
        },
        critical_diagnosis_marker: Some("myocardial infarction"),
    },
    RedFlagRule {
        name: "possible acute stroke pattern",
        trigger: RedFlagTrigger::SymptomCombo {
            required: "slurred speech",
            with_any: &["weakness", "facial droop"],
        },
        critical_diagnosis_marker: Some("stroke"),
    },
    RedFlagRule {
        name: "ECG ST-segment elevation",
        trigger: RedFlagTrigger::TestMarkers {
            test: "ecg",
            markers: &["st", "elevation"],
        },
        critical_diagnosis_marker: None,
    },
    RedFlagRule {
        name: "elevated troponin",
        trigger: RedFlagTrigger::TestMarkers {
            test: "troponin",
            markers: &["troponin", "elevated"],
        },
        critical_diagnosis_marker: None,
    },
];

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
    fn test_symptom_combo_needs_companion() {
        let rule = &RED_FLAG_RULES[0];
        assert!(!rule.fires(&state(&["chest pain"])));
        assert!(rule.fires(&state(&["chest pain", "diaphoresis"])));
        assert!(rule.fires(&state(&["chest pain", "tachypnea"])));
    }

    #[test]
    fn test_test_marker_rule() {
        let rule = &RED_FLAG_RULES[2];
        let mut s = state(&["chest pain"]);
        assert!(!rule.fires(&s));

        s.completed_tests
            .insert("ecg".into(), "ST elevation in inferior leads".into());
        assert!(rule.fires(&s));
    }

    #[test]
    fn test_stroke_combo() {
        let rule = &RED_FLAG_RULES[1];
        assert!(rule.fires(&state(&["slurred speech", "left arm weakness"])));
        assert!(rule.fires(&state(&["slurred speech", "facial droop"])));
        assert!(!rule.fires(&state(&["slurred speech"])));
    }
}
