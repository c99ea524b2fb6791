//! Guideline corpus documents.

use serde::{Deserialize, Serialize};

/// One guideline snippet in the retrieval corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuidelineDoc {
    pub id: String,
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: String,
}

/// Parse a corpus payload (a JSON array of documents). Malformed entries are
/// skipped, not fatal; a non-array payload yields an empty corpus.
pub fn parse_corpus(payload: &serde_json::Value) -> Vec<GuidelineDoc> {
    let Some(items) = payload.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let doc: GuidelineDoc = serde_json::from_value(item.clone()).ok()?;
            let well_formed = !doc.id.trim().is_empty()
                && !doc.title.trim().is_empty()
                && !doc.source.trim().is_empty()
                && !doc.content.trim().is_empty();
            well_formed.then_some(doc)
        })
        .collect()
}

fn doc(
    id: &str,
    title: &str,
    source: &str,
    tags: &[&str],
    content: &str,
) -> GuidelineDoc {
    GuidelineDoc {
        id: id.into(),
        title: title.into(),
        source: source.into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        content: content.into(),
    }
}

/// Compiled-in guideline corpus, one snippet per supported cluster.
pub fn builtin_corpus() -> Vec<GuidelineDoc> {
    vec![
        doc(
            "acs-001",
            "Acute coronary syndrome emergency pathway",
            "AHA/ESC chest pain pathway (summary)",
            &["chest pain", "myocardial infarction", "ecg", "troponin", "reperfusion"],
            "Patients with suspected acute coronary syndrome need an immediate 12-lead ECG, \
             serial troponin measurement, and prompt reperfusion assessment when indicated.",
        ),
        doc(
            "cap-001",
            "Community-acquired pneumonia outpatient management",
            "ATS/IDSA CAP guideline (summary)",
            &["pneumonia", "cough", "fever", "chest_xray", "antimicrobial"],
            "Suspected community-acquired pneumonia warrants chest imaging plus inflammatory \
             markers, early empiric antimicrobial therapy, and an admission-criteria review.",
        ),
        doc(
            "app-001",
            "Acute appendicitis assessment and surgical consult",
            "WSES appendicitis guideline (summary)",
            &["appendicitis", "right lower quadrant pain", "abdominal_ultrasound", "surgery"],
            "Migratory right lower quadrant pain with rising inflammatory markers calls for \
             prompt imaging and an early surgical consult.",
        ),
        doc(
            "uti-001",
            "Acute lower urinary tract infection management",
            "EAU UTI guideline (summary)",
            &["urinary tract infection", "dysuria", "urinary frequency", "urinalysis", "urine_culture"],
            "Acute lower urinary tract infection is confirmed with urinalysis and, when needed, \
             urine culture; antimicrobial choice should reflect local resistance and culture results.",
        ),
        doc(
            "stroke-001",
            "Acute ischemic stroke fast-track pathway",
            "AHA/ASA stroke guideline (summary)",
            &["stroke", "slurred speech", "weakness", "head_ct", "nihss", "reperfusion"],
            "Suspected acute stroke requires immediate neurological scoring and brain imaging to \
             exclude hemorrhage, followed by rapid reperfusion-window assessment.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_skips_malformed_entries() {
        let payload = serde_json::json!([
            {
                "id": "g1",
                "title": "Valid doc",
                "source": "somewhere",
                "tags": ["a"],
                "content": "body"
            },
            {"id": "g2", "title": "missing content", "source": "s"},
            {"id": "", "title": "blank id", "source": "s", "content": "body"},
            "not an object"
        ]);
        let docs = parse_corpus(&payload);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "g1");
    }

    #[test]
    fn test_parse_corpus_non_array_is_empty() {
        assert!(parse_corpus(&serde_json::json!({"id": "g1"})).is_empty());
    }

    #[test]
    fn test_builtin_corpus_well_formed() {
        let docs = builtin_corpus();
        assert_eq!(docs.len(), 5);
        for d in &docs {
            assert!(!d.id.is_empty());
            assert!(!d.tags.is_empty());
            assert!(!d.content.is_empty());
        }
    }
}
