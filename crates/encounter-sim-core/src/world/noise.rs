//! Layered observation-noise overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which kind of signal a noise probability applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Qa,
    Test,
}

/// Layered override configuration for observation noise, resolved at read
/// time. Immutable after session start.
///
/// Precedence, most specific first: per-case-per-signal, per-signal,
/// per-case, profile default, instance base probability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseProfile {
    /// Overrides the instance base probability for every signal
    pub default: Option<f64>,
    /// case id → probability
    pub case: BTreeMap<String, f64>,
    /// test name → probability
    pub test: BTreeMap<String, f64>,
    /// question key → probability
    pub qa: BTreeMap<String, f64>,
    /// case id → test name → probability
    pub case_test: BTreeMap<String, BTreeMap<String, f64>>,
    /// case id → question key → probability
    pub case_qa: BTreeMap<String, BTreeMap<String, f64>>,
}

impl NoiseProfile {
    /// Resolve the effective noise probability for one signal.
    ///
    /// The override chain is an ordered list evaluated first-match-wins, so
    /// precedence stays auditable. The result is clamped to [0, 1].
    pub fn resolve(&self, base: f64, case_id: &str, kind: SignalKind, signal: &str) -> f64 {
        let (per_signal, per_case_signal) = match kind {
            SignalKind::Qa => (&self.qa, &self.case_qa),
            SignalKind::Test => (&self.test, &self.case_test),
        };

        let layers = [
            per_case_signal
                .get(case_id)
                .and_then(|signals| signals.get(signal))
                .copied(),
            per_signal.get(signal).copied(),
            self.case.get(case_id).copied(),
            self.default,
        ];

        layers
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_else(|| base.clamp(0.0, 1.0))
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(json: serde_json::Value) -> NoiseProfile {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_base_used_when_profile_empty() {
        let p = NoiseProfile::default();
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Test, "ecg"), 0.15);
    }

    #[test]
    fn test_default_overrides_base() {
        let p = profile(serde_json::json!({"default": 0.4}));
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Qa, "onset"), 0.4);
    }

    #[test]
    fn test_case_overrides_default() {
        let p = profile(serde_json::json!({"default": 0.4, "case": {"c1": 0.6}}));
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Test, "ecg"), 0.6);
        assert_eq!(p.resolve(0.15, "c2", SignalKind::Test, "ecg"), 0.4);
    }

    #[test]
    fn test_signal_overrides_case() {
        let p = profile(serde_json::json!({
            "case": {"c1": 0.6},
            "test": {"ecg": 0.8}
        }));
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Test, "ecg"), 0.8);
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Test, "cbc"), 0.6);
    }

    #[test]
    fn test_case_signal_is_most_specific() {
        let p = profile(serde_json::json!({
            "default": 0.0,
            "test": {"cbc": 0.2},
            "case_test": {"resp_001": {"cbc": 1.0}}
        }));
        assert_eq!(p.resolve(0.15, "resp_001", SignalKind::Test, "cbc"), 1.0);
        assert_eq!(p.resolve(0.15, "other", SignalKind::Test, "cbc"), 0.2);
        assert_eq!(p.resolve(0.15, "resp_001", SignalKind::Test, "chest_xray"), 0.0);
    }

    #[test]
    fn test_qa_and_test_namespaces_are_separate() {
        let p = profile(serde_json::json!({"qa": {"onset": 1.0}}));
        assert_eq!(p.resolve(0.0, "c1", SignalKind::Qa, "onset"), 1.0);
        assert_eq!(p.resolve(0.0, "c1", SignalKind::Test, "onset"), 0.0);
    }

    #[test]
    fn test_resolved_value_clamped() {
        let p = profile(serde_json::json!({"default": 3.5}));
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Test, "ecg"), 1.0);

        let p = profile(serde_json::json!({"case": {"c1": -2.0}}));
        assert_eq!(p.resolve(0.15, "c1", SignalKind::Test, "ecg"), 0.0);
    }
}
