//! Compiled-in case catalog.
//!
//! Five vignettes spanning the supported symptom clusters. Canonical text is
//! plain English so downstream keyword predicates stay readable; variant pools
//! reword or degrade the canonical finding without inventing a new one.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use crate::models::PatientCase;

use super::VariantMap;

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn string_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn chest_pain_001() -> PatientCase {
    PatientCase {
        case_id: "chest_pain_001".into(),
        demographics: [
            ("age".to_string(), json!(58)),
            ("sex".to_string(), json!("male")),
            ("history".to_string(), json!("hypertension, long-term smoker")),
        ]
        .into_iter()
        .collect(),
        symptoms: strings(&["chest pain", "tachypnea", "diaphoresis"]),
        qa: string_map(&[
            (
                "onset",
                "Sudden crushing chest pain that started about one hour ago while climbing stairs.",
            ),
            ("allergy", "No known drug allergies."),
            (
                "risk_factor",
                "Long-term smoker with poorly controlled hypertension.",
            ),
        ]),
        tests: string_map(&[
            (
                "ecg",
                "ECG shows ST elevation in leads II, III and aVF with reciprocal depression in I and aVL.",
            ),
            (
                "troponin",
                "Troponin I elevated at 2.3 ng/mL (reference < 0.04 ng/mL).",
            ),
            (
                "chest_xray",
                "Chest X-ray shows no acute cardiopulmonary abnormality.",
            ),
        ]),
        final_diagnosis: "acute inferior myocardial infarction".into(),
        key_tests: string_set(&["ecg", "troponin"]),
    }
}

fn resp_001() -> PatientCase {
    PatientCase {
        case_id: "resp_001".into(),
        demographics: [
            ("age".to_string(), json!(34)),
            ("sex".to_string(), json!("female")),
            ("history".to_string(), json!("previously healthy")),
        ]
        .into_iter()
        .collect(),
        symptoms: strings(&["fever", "productive cough", "pleuritic discomfort"]),
        qa: string_map(&[
            ("onset", "Fever and a worsening cough for the past three days."),
            ("allergy", "Allergic to penicillin (rash)."),
            ("risk_factor", "Works in a kindergarten; no recent travel."),
        ]),
        tests: string_map(&[
            (
                "cbc",
                "White cell count elevated at 14.2 x10^9/L with neutrophil predominance.",
            ),
            (
                "chest_xray",
                "Chest X-ray shows a right lower lobe infiltrate.",
            ),
            ("crp", "CRP elevated at 86 mg/L."),
        ]),
        final_diagnosis: "community-acquired pneumonia".into(),
        key_tests: string_set(&["cbc", "chest_xray"]),
    }
}

fn abd_001() -> PatientCase {
    PatientCase {
        case_id: "abd_001".into(),
        demographics: [
            ("age".to_string(), json!(23)),
            ("sex".to_string(), json!("male")),
        ]
        .into_iter()
        .collect(),
        symptoms: strings(&["right lower quadrant pain", "nausea", "low-grade fever"]),
        qa: string_map(&[
            (
                "onset",
                "Periumbilical pain since yesterday, now migrated to the right lower quadrant.",
            ),
            ("allergy", "No known allergies."),
            ("risk_factor", "No prior abdominal surgery."),
        ]),
        tests: string_map(&[
            (
                "abdominal_ultrasound",
                "Ultrasound shows an enlarged, noncompressible appendix (9 mm) with focal tenderness.",
            ),
            ("cbc", "White cell count elevated at 13.1 x10^9/L."),
        ]),
        final_diagnosis: "acute appendicitis".into(),
        key_tests: string_set(&["abdominal_ultrasound"]),
    }
}

fn uti_001() -> PatientCase {
    PatientCase {
        case_id: "uti_001".into(),
        demographics: [
            ("age".to_string(), json!(29)),
            ("sex".to_string(), json!("female")),
        ]
        .into_iter()
        .collect(),
        symptoms: strings(&["dysuria", "urinary frequency"]),
        qa: string_map(&[
            ("onset", "Burning on urination for two days with frequent small voids."),
            ("allergy", "No known allergies."),
            ("risk_factor", "One prior uncomplicated urinary infection last year."),
        ]),
        tests: string_map(&[
            (
                "urinalysis",
                "Urinalysis positive for nitrites and leukocyte esterase.",
            ),
            (
                "urine_culture",
                "Urine culture grew Escherichia coli at > 10^5 CFU/mL.",
            ),
        ]),
        final_diagnosis: "acute lower urinary tract infection".into(),
        key_tests: string_set(&["urinalysis", "urine_culture"]),
    }
}

fn stroke_001() -> PatientCase {
    PatientCase {
        case_id: "stroke_001".into(),
        demographics: [
            ("age".to_string(), json!(67)),
            ("sex".to_string(), json!("male")),
            ("history".to_string(), json!("atrial fibrillation, not anticoagulated")),
        ]
        .into_iter()
        .collect(),
        symptoms: strings(&["slurred speech", "left arm weakness", "facial droop"]),
        qa: string_map(&[
            ("onset", "Speech became slurred abruptly 90 minutes ago at breakfast."),
            ("allergy", "No known allergies."),
            ("risk_factor", "Atrial fibrillation without anticoagulation."),
        ]),
        tests: string_map(&[
            (
                "head_ct",
                "Head CT shows no acute hemorrhage; early ischemic change in the right MCA territory.",
            ),
            (
                "nihss",
                "NIHSS score 9: dysarthria, left arm drift, and facial palsy.",
            ),
        ]),
        final_diagnosis: "acute ischemic stroke".into(),
        key_tests: string_set(&["head_ct", "nihss"]),
    }
}

/// All built-in cases, keyed by case id.
pub(super) fn builtin_cases() -> BTreeMap<String, PatientCase> {
    [
        chest_pain_001(),
        resp_001(),
        abd_001(),
        uti_001(),
        stroke_001(),
    ]
    .into_iter()
    .map(|case| (case.case_id.clone(), case))
    .collect()
}

/// Built-in variant pools: (qa_variants, test_variants).
///
/// Variants keep the clinically decisive phrase so that a noisy draw degrades
/// wording, not the underlying finding.
pub(super) fn builtin_variants() -> (VariantMap, VariantMap) {
    let mut qa: VariantMap = BTreeMap::new();
    let mut test: VariantMap = BTreeMap::new();

    qa.entry("chest_pain_001".into()).or_default().insert(
        "onset".into(),
        strings(&[
            "Chest pain came on suddenly roughly an hour ago; the patient is vague about the exact time.",
        ]),
    );

    test.entry("chest_pain_001".into()).or_default().extend([
        (
            "ecg".to_string(),
            strings(&[
                "ECG tracing degraded by motion artifact; ST elevation still apparent in the inferior leads.",
            ]),
        ),
        (
            "troponin".to_string(),
            strings(&[
                "Troponin I elevated at 1.1 ng/mL on a hemolyzed sample; repeat draw advised.",
            ]),
        ),
    ]);

    test.entry("resp_001".into()).or_default().extend([
        (
            "cbc".to_string(),
            strings(&[
                "White cell count 13.6 x10^9/L, borderline elevated; differential pending.",
                "White cell count elevated; analyzer flagged the sample for manual review.",
            ]),
        ),
        (
            "chest_xray".to_string(),
            strings(&[
                "Patchy right basal opacity, infiltrate versus atelectasis; repeat film suggested.",
            ]),
        ),
    ]);

    test.entry("uti_001".into()).or_default().insert(
        "urinalysis".into(),
        strings(&["Urinalysis positive for nitrites; leukocyte esterase trace only."]),
    );

    test.entry("stroke_001".into()).or_default().insert(
        "head_ct".into(),
        strings(&[
            "Head CT limited by motion; no acute hemorrhage identified on the diagnostic series.",
        ]),
    );

    (qa, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_cases_well_formed() {
        let cases = builtin_cases();
        assert_eq!(cases.len(), 5);
        for (id, case) in &cases {
            assert_eq!(id, &case.case_id);
            assert!(!case.final_diagnosis.is_empty());
            assert!(!case.tests.is_empty());
            assert!(!case.symptoms.is_empty());
        }
    }

    #[test]
    fn test_key_tests_exist_in_test_map() {
        for case in builtin_cases().values() {
            for key_test in &case.key_tests {
                assert!(
                    case.tests.contains_key(key_test),
                    "{}: key test {} missing from test map",
                    case.case_id,
                    key_test
                );
            }
        }
    }

    #[test]
    fn test_variant_signals_exist_on_cases() {
        let cases = builtin_cases();
        let (qa, test) = builtin_variants();
        for (case_id, signals) in &qa {
            let case = &cases[case_id];
            for signal in signals.keys() {
                assert!(case.qa.contains_key(signal));
            }
        }
        for (case_id, signals) in &test {
            let case = &cases[case_id];
            for signal in signals.keys() {
                assert!(case.tests.contains_key(signal));
            }
        }
    }
}
