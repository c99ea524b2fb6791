//! Scripted patient vignettes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A static scripted patient vignette: ground-truth facts, canonical test
/// results, and the final diagnosis. Immutable once loaded into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientCase {
    /// Unique case identifier within the catalog
    pub case_id: String,
    /// Demographic attributes (age, sex, occupation, ...)
    pub demographics: BTreeMap<String, serde_json::Value>,
    /// Presenting symptoms, in presentation order
    pub symptoms: Vec<String>,
    /// Question key → canonical answer
    pub qa: BTreeMap<String, String>,
    /// Test name → canonical result text
    pub tests: BTreeMap<String, String>,
    /// Ground-truth diagnosis label
    pub final_diagnosis: String,
    /// Tests considered decisive for this case
    pub key_tests: BTreeSet<String>,
}

impl PatientCase {
    /// Create a case with the required identity fields; maps start empty.
    pub fn new(case_id: String, final_diagnosis: String) -> Self {
        Self {
            case_id,
            demographics: BTreeMap::new(),
            symptoms: Vec::new(),
            qa: BTreeMap::new(),
            tests: BTreeMap::new(),
            final_diagnosis,
            key_tests: BTreeSet::new(),
        }
    }

    /// Sorted names of the tests this case can answer.
    pub fn available_tests(&self) -> Vec<String> {
        self.tests.keys().cloned().collect()
    }
}
