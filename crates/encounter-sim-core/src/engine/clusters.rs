//! Declarative symptom-cluster table.
//!
//! Each cluster bundles its symptom match predicate, ordered test pathway,
//! evidence rules, diagnosis label, and treatment text. The engine iterates
//! the table in priority order, so adding a cluster never touches control
//! flow.

use crate::models::ObservedState;

/// How a cluster matches the presenting symptoms.
#[derive(Debug, Clone, Copy)]
pub enum SymptomMatch {
    /// Any one keyword present
    Any(&'static [&'static str]),
    /// Every keyword present
    All(&'static [&'static str]),
}

impl SymptomMatch {
    pub fn matches(&self, symptom_text: &str) -> bool {
        match self {
            SymptomMatch::Any(keys) => keys.iter().any(|k| symptom_text.contains(k)),
            SymptomMatch::All(keys) => keys.iter().all(|k| symptom_text.contains(k)),
        }
    }
}

/// One test in a cluster's workup pathway.
#[derive(Debug, Clone, Copy)]
pub struct PathwayStep {
    pub test: &'static str,
    /// Skip this step once the cluster's evidence predicate is satisfied;
    /// used for the "only if still inconclusive" follow-up tests.
    pub unless_evidence: bool,
}

const fn step(test: &'static str) -> PathwayStep {
    PathwayStep {
        test,
        unless_evidence: false,
    }
}

const fn step_if_inconclusive(test: &'static str) -> PathwayStep {
    PathwayStep {
        test,
        unless_evidence: true,
    }
}

/// A completed test must contain every marker (lowercase substring check) for
/// the rule to hold; a cluster's evidence predicate is the conjunction of its
/// rules.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceRule {
    pub test: &'static str,
    pub markers: &'static [&'static str],
}

impl EvidenceRule {
    pub fn satisfied(&self, state: &ObservedState) -> bool {
        let text = state.test_text(self.test);
        !text.is_empty() && self.markers.iter().all(|m| text.contains(m))
    }
}

/// One symptom cluster: match predicate, workup pathway, evidence predicate,
/// and the diagnosis it supports.
#[derive(Debug, Clone, Copy)]
pub struct ClusterSpec {
    pub name: &'static str,
    pub symptoms: SymptomMatch,
    pub pathway: &'static [PathwayStep],
    pub evidence: &'static [EvidenceRule],
    pub diagnosis: &'static str,
    pub treatment: &'static str,
}

impl ClusterSpec {
    /// Whether every evidence rule holds over the completed tests.
    pub fn evidence_satisfied(&self, state: &ObservedState) -> bool {
        self.evidence.iter().all(|rule| rule.satisfied(state))
    }
}

/// Sentinel diagnosis when no cluster's evidence predicate is satisfied.
pub const INSUFFICIENT_EVIDENCE: &str = "insufficient evidence; additional workup required";

/// Treatment text for the sentinel diagnosis.
pub const GATHER_EVIDENCE_PLAN: &str =
    "Complete the key investigations before committing to a management plan.";

/// Clusters in fixed priority order; first match wins for action selection,
/// first satisfied evidence predicate wins for diagnosis inference.
pub const CLUSTERS: &[ClusterSpec] = &[
    ClusterSpec {
        name: "cardiac",
        symptoms: SymptomMatch::Any(&["chest pain"]),
        pathway: &[step("ecg"), step("troponin"), step_if_inconclusive("chest_xray")],
        evidence: &[
            EvidenceRule {
                test: "ecg",
                markers: &["st", "elevation"],
            },
            EvidenceRule {
                test: "troponin",
                markers: &["troponin", "elevated"],
            },
        ],
        diagnosis: "acute inferior myocardial infarction",
        treatment: "Activate the emergency chest-pain pathway: continuous cardiac monitoring, \
                    antiplatelet therapy, and immediate reperfusion assessment.",
    },
    ClusterSpec {
        name: "respiratory",
        symptoms: SymptomMatch::All(&["fever", "cough"]),
        pathway: &[step("cbc"), step("chest_xray"), step_if_inconclusive("crp")],
        evidence: &[EvidenceRule {
            test: "chest_xray",
            markers: &["infiltrate"],
        }],
        diagnosis: "community-acquired pneumonia",
        treatment: "Start empiric antimicrobial therapy, monitor oxygen saturation, and assess \
                    admission criteria.",
    },
    ClusterSpec {
        name: "abdominal",
        symptoms: SymptomMatch::Any(&["right lower quadrant pain"]),
        pathway: &[step("abdominal_ultrasound")],
        evidence: &[EvidenceRule {
            test: "abdominal_ultrasound",
            markers: &["appendix"],
        }],
        diagnosis: "acute appendicitis",
        treatment: "Request a surgical consult to weigh antimicrobial therapy against timing of \
                    appendectomy.",
    },
    ClusterSpec {
        name: "urinary",
        symptoms: SymptomMatch::Any(&["dysuria", "urinary frequency"]),
        pathway: &[step("urinalysis"), step("urine_culture")],
        evidence: &[
            EvidenceRule {
                test: "urinalysis",
                markers: &["nitrite"],
            },
            EvidenceRule {
                test: "urine_culture",
                markers: &["coli"],
            },
        ],
        diagnosis: "acute lower urinary tract infection",
        treatment: "Start empiric antimicrobial therapy, adjust to culture results, and encourage \
                    hydration.",
    },
    ClusterSpec {
        name: "neurological",
        symptoms: SymptomMatch::Any(&["slurred speech", "limb weakness", "arm weakness", "facial droop"]),
        pathway: &[step("head_ct"), step("nihss")],
        evidence: &[
            EvidenceRule {
                test: "head_ct",
                markers: &["no acute hemorrhage"],
            },
            EvidenceRule {
                test: "nihss",
                markers: &["nihss"],
            },
        ],
        diagnosis: "acute ischemic stroke",
        treatment: "Activate the stroke pathway immediately: confirm the reperfusion window and \
                    begin neurological monitoring.",
    },
];

/// First cluster whose symptom predicate matches, in priority order.
pub fn match_cluster(state: &ObservedState) -> Option<&'static ClusterSpec> {
    let symptom_text = state.symptom_text();
    CLUSTERS.iter().find(|c| c.symptoms.matches(&symptom_text))
}

/// Cluster carrying a given diagnosis label.
pub fn cluster_for_diagnosis(diagnosis: &str) -> Option<&'static ClusterSpec> {
    CLUSTERS.iter().find(|c| c.diagnosis == diagnosis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientCase;

    fn state_with_symptoms(symptoms: &[&str]) -> ObservedState {
        let mut case = PatientCase::new("t1".into(), "dx".into());
        case.symptoms = symptoms.iter().map(|s| s.to_string()).collect();
        ObservedState::for_case(&case)
    }

    #[test]
    fn test_symptom_match_any_and_all() {
        assert!(SymptomMatch::Any(&["chest pain"]).matches("crushing chest pain and sweating"));
        assert!(!SymptomMatch::Any(&["chest pain"]).matches("abdominal pain"));
        assert!(SymptomMatch::All(&["fever", "cough"]).matches("fever productive cough"));
        assert!(!SymptomMatch::All(&["fever", "cough"]).matches("fever only"));
    }

    #[test]
    fn test_cluster_priority_order() {
        // Chest pain wins over a co-present respiratory picture.
        let state = state_with_symptoms(&["chest pain", "fever", "cough"]);
        assert_eq!(match_cluster(&state).unwrap().name, "cardiac");

        let state = state_with_symptoms(&["fever", "productive cough"]);
        assert_eq!(match_cluster(&state).unwrap().name, "respiratory");

        let state = state_with_symptoms(&["fatigue"]);
        assert!(match_cluster(&state).is_none());
    }

    #[test]
    fn test_evidence_rule_requires_all_markers() {
        let mut state = state_with_symptoms(&["chest pain"]);
        let rule = EvidenceRule {
            test: "ecg",
            markers: &["st", "elevation"],
        };
        assert!(!rule.satisfied(&state));

        state
            .completed_tests
            .insert("ecg".into(), "Nonspecific ST changes".into());
        assert!(!rule.satisfied(&state));

        state
            .completed_tests
            .insert("ecg".into(), "ST elevation in inferior leads".into());
        assert!(rule.satisfied(&state));
    }

    #[test]
    fn test_cluster_for_diagnosis() {
        assert_eq!(
            cluster_for_diagnosis("acute appendicitis").unwrap().name,
            "abdominal"
        );
        assert!(cluster_for_diagnosis(INSUFFICIENT_EVIDENCE).is_none());
    }
}
