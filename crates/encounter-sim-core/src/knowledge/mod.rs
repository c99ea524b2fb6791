//! Guideline retriever.
//!
//! Ranks a small in-memory corpus by lexical overlap against a
//! diagnosis-plus-evidence query. The corpus is loaded once; nothing is
//! re-fetched per call.

mod corpus;

pub use corpus::{builtin_corpus, parse_corpus, GuidelineDoc};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One ranked retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuidelineHit {
    pub doc: GuidelineDoc,
    /// Count of query tokens present in the document
    pub score: usize,
    /// score / max(1, best score among selected), rounded to 3 decimals
    pub confidence: f64,
}

impl GuidelineHit {
    /// Citation line used in composed messages.
    pub fn citation(&self) -> String {
        format!(
            "{}: {} | {} | confidence={:.3}",
            self.doc.id, self.doc.title, self.doc.source, self.confidence
        )
    }
}

/// Token-overlap retriever over an immutable corpus.
#[derive(Debug, Clone)]
pub struct GuidelineRetriever {
    docs: Vec<GuidelineDoc>,
}

impl Default for GuidelineRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidelineRetriever {
    /// Retriever over the compiled-in corpus.
    pub fn new() -> Self {
        Self {
            docs: builtin_corpus(),
        }
    }

    /// Retriever over an externally loaded corpus; an empty load falls back
    /// to the compiled-in corpus.
    pub fn with_docs(docs: Vec<GuidelineDoc>) -> Self {
        if docs.is_empty() {
            return Self::new();
        }
        Self { docs }
    }

    /// Rank documents by query-token overlap, keep positive scores, and take
    /// the top `max(1, top_k)`. Ties keep the original corpus order.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<GuidelineHit> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &GuidelineDoc)> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let bag = tokenize(&format!(
                    "{} {} {}",
                    doc.title,
                    doc.tags.join(" "),
                    doc.content
                ));
                let score = terms.iter().filter(|t| bag.contains(*t)).count();
                (score > 0).then_some((score, doc))
            })
            .collect();

        // Stable sort preserves corpus order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k.max(1));

        let max_score = scored.iter().map(|(s, _)| *s).max().unwrap_or(0);
        scored
            .into_iter()
            .map(|(score, doc)| GuidelineHit {
                doc: doc.clone(),
                score,
                confidence: round3(score as f64 / max_score.max(1) as f64),
            })
            .collect()
    }
}

/// Lowercase word set; any non-alphanumeric character separates tokens, which
/// keeps the split Unicode-aware.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
