//! Case source: the immutable catalog of scripted vignettes.
//!
//! A catalog is either the compiled-in default or loaded once from a
//! directory of `*.json` case files plus an optional `variants.json`.
//! Malformed case data is fatal at load time; the running system never
//! re-reads the catalog.

mod builtin;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::PatientCase;

/// case id → signal name → variant pool.
pub type VariantMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Immutable mapping from case identifier to vignette, with the noise-variant
/// pools keyed by case then signal name.
#[derive(Debug, Clone)]
pub struct CaseCatalog {
    cases: BTreeMap<String, PatientCase>,
    qa_variants: VariantMap,
    test_variants: VariantMap,
}

/// On-disk case shape. `key_tests` is optional; everything else is required.
#[derive(Debug, Deserialize)]
struct RawCase {
    case_id: String,
    demographics: BTreeMap<String, serde_json::Value>,
    symptoms: Vec<String>,
    qa: BTreeMap<String, String>,
    tests: BTreeMap<String, String>,
    final_diagnosis: String,
    #[serde(default)]
    key_tests: Vec<String>,
}

/// On-disk shape of `variants.json`.
#[derive(Debug, Deserialize, Default)]
struct RawVariants {
    #[serde(default)]
    qa_variants: VariantMap,
    #[serde(default)]
    test_variants: VariantMap,
}

impl CaseCatalog {
    /// The compiled-in default catalog.
    pub fn builtin() -> Self {
        let (qa_variants, test_variants) = builtin::builtin_variants();
        Self {
            cases: builtin::builtin_cases(),
            qa_variants,
            test_variants,
        }
    }

    /// Load every `*.json` case file under `dir`, plus `variants.json` if
    /// present. Fails on the first malformed file; guarantees at least one
    /// case and unique case identifiers.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "cases directory {}",
                dir.display()
            )));
        }

        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|e| Error::malformed("cases directory", e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut cases = BTreeMap::new();
        let mut variants = RawVariants::default();

        for path in paths {
            let raw = fs::read_to_string(&path)
                .map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))?;

            if path.file_name().is_some_and(|n| n == "variants.json") {
                variants = serde_json::from_str(&raw)
                    .map_err(|e| Error::malformed("variants.json", e.to_string()))?;
                continue;
            }

            let parsed: RawCase = serde_json::from_str(&raw)
                .map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))?;
            let case = validate_case(parsed, &path)?;
            if cases.contains_key(&case.case_id) {
                return Err(Error::malformed(
                    path.display().to_string(),
                    format!("duplicate case_id {}", case.case_id),
                ));
            }
            cases.insert(case.case_id.clone(), case);
        }

        if cases.is_empty() {
            return Err(Error::malformed(
                "cases directory",
                format!("no case JSON files under {}", dir.display()),
            ));
        }

        Ok(Self {
            cases,
            qa_variants: variants.qa_variants,
            test_variants: variants.test_variants,
        })
    }

    pub fn get(&self, case_id: &str) -> Option<&PatientCase> {
        self.cases.get(case_id)
    }

    /// Sorted case identifiers.
    pub fn case_ids(&self) -> Vec<String> {
        self.cases.keys().cloned().collect()
    }

    /// Key tests for a case.
    pub fn key_tests(&self, case_id: &str) -> Result<&BTreeSet<String>> {
        self.cases
            .get(case_id)
            .map(|c| &c.key_tests)
            .ok_or_else(|| Error::NotFound(format!("case {case_id}")))
    }

    /// Registered answer variants for a question key, possibly empty.
    pub fn qa_variants(&self, case_id: &str, question: &str) -> &[String] {
        lookup_variants(&self.qa_variants, case_id, question)
    }

    /// Registered result variants for a test name, possibly empty.
    pub fn test_variants(&self, case_id: &str, test: &str) -> &[String] {
        lookup_variants(&self.test_variants, case_id, test)
    }
}

fn lookup_variants<'a>(map: &'a VariantMap, case_id: &str, signal: &str) -> &'a [String] {
    map.get(case_id)
        .and_then(|signals| signals.get(signal))
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

fn validate_case(raw: RawCase, path: &Path) -> Result<PatientCase> {
    let context = path.display().to_string();
    if raw.case_id.trim().is_empty() {
        return Err(Error::malformed(context, "empty case_id"));
    }
    if raw.final_diagnosis.trim().is_empty() {
        return Err(Error::malformed(context, "empty final_diagnosis"));
    }
    if raw.tests.is_empty() {
        return Err(Error::malformed(context, "case has no tests"));
    }
    Ok(PatientCase {
        case_id: raw.case_id,
        demographics: raw.demographics,
        symptoms: raw.symptoms,
        qa: raw.qa,
        tests: raw.tests,
        final_diagnosis: raw.final_diagnosis,
        key_tests: raw.key_tests.into_iter().collect(),
    })
}
