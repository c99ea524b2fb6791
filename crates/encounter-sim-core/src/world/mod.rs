//! Stochastic world model.
//!
//! One instance per session. Holds the mutable observed state and answers
//! ask/order/recommend actions by sampling canonical facts or registered
//! noise variants from a seeded generator, so a fixed seed and action
//! sequence reproduces the exact observation sequence.

mod noise;

pub use noise::{NoiseProfile, SignalKind};

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cases::CaseCatalog;
use crate::error::{Error, Result};
use crate::models::{Action, ActionKind, ActionResult, ObservedState, PatientCase};

/// Observation returned when a question key has no scripted answer.
const ANSWER_UNAVAILABLE: &str = "The patient cannot provide that information right now.";
/// Observation returned when an ordered test is not in the case's test map.
const TEST_UNAVAILABLE: &str = "That test is not available for this case; choose from the available tests.";
/// Observations for recommend-plan consistency feedback.
const PLAN_CONSISTENT: &str =
    "The proposed diagnosis is consistent with the case; proceed to the management plan.";
const PLAN_INCONSISTENT: &str =
    "Evidence is insufficient or the direction is inconsistent; continue the history and workup.";

/// Fixed synonyms for question keys, including the bilingual forms the
/// scripted vignettes were originally authored with.
const QUESTION_ALIASES: &[(&str, &str)] = &[
    ("onset", "onset"),
    ("起病时间", "onset"),
    ("allergy", "allergy"),
    ("过敏史", "allergy"),
    ("risk", "risk_factor"),
    ("risk_factor", "risk_factor"),
    ("危险因素", "risk_factor"),
];

/// Construction-time knobs for a [`WorldModel`].
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Seed for the observation generator; entropy-seeded when `None`
    pub seed: Option<u64>,
    /// Base noise probability before profile overrides, clamped to [0, 1]
    pub observation_noise: f64,
    /// Layered per-case/per-signal overrides
    pub noise_profile: NoiseProfile,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            observation_noise: 0.15,
            noise_profile: NoiseProfile::default(),
        }
    }
}

/// Rule-based clinical world model with reset/step semantics.
pub struct WorldModel {
    catalog: Arc<CaseCatalog>,
    case: Option<PatientCase>,
    state: Option<ObservedState>,
    rng: StdRng,
    observation_noise: f64,
    noise_profile: NoiseProfile,
}

impl WorldModel {
    pub fn new(catalog: Arc<CaseCatalog>, config: WorldConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog,
            case: None,
            state: None,
            rng,
            observation_noise: config.observation_noise.clamp(0.0, 1.0),
            noise_profile: config.noise_profile,
        }
    }

    /// Bind a fresh observed state to `case_id` and reseed the generator if a
    /// seed is given. Transitions the model to the ready state.
    pub fn reset(&mut self, case_id: &str, seed: Option<u64>) -> Result<ObservedState> {
        let case = self
            .catalog
            .get(case_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("case {case_id}")))?;
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let mut state = ObservedState::for_case(&case);
        state.history.push(format!("session_started:{case_id}"));
        self.case = Some(case);
        self.state = Some(state.clone());
        Ok(state)
    }

    /// Answer one action, mutating observed state as the action dictates.
    pub fn step(&mut self, action: &Action) -> Result<ActionResult> {
        if self.case.is_none() || self.state.is_none() {
            return Err(Error::InvalidState);
        }

        match action {
            Action::AskQuestion { question } => self.answer_question(question),
            Action::OrderTest { test } => self.run_test(test),
            Action::RecommendPlan { diagnosis } => self.evaluate_recommendation(diagnosis),
        }
    }

    /// Defensive copy of the observed state.
    pub fn state(&self) -> Result<ObservedState> {
        self.state.clone().ok_or(Error::InvalidState)
    }

    /// Ground-truth diagnosis label; evaluation tooling only.
    pub fn true_diagnosis(&self) -> Result<&str> {
        self.case
            .as_ref()
            .map(|c| c.final_diagnosis.as_str())
            .ok_or(Error::InvalidState)
    }

    fn answer_question(&mut self, question: &str) -> Result<ActionResult> {
        let question = question.trim().to_lowercase();
        let case = self.case.as_ref().expect("checked in step");

        let resolved = if case.qa.contains_key(question.as_str()) {
            Some(question.clone())
        } else {
            QUESTION_ALIASES
                .iter()
                .find(|(alias, _)| *alias == question)
                .map(|(_, key)| key.to_string())
                .filter(|key| case.qa.contains_key(key))
        };

        let state = self.state.as_mut().expect("checked in step");
        let Some(key) = resolved else {
            // Unknown question: history tag only, no fact recorded.
            state.history.push(format!("ask:{question}"));
            return Ok(ActionResult::plain(ActionKind::AskQuestion, ANSWER_UNAVAILABLE));
        };

        let canonical = case.qa[&key].clone();
        let variants = self.catalog.qa_variants(&case.case_id, &key).to_vec();
        let noise =
            self.noise_profile
                .resolve(self.observation_noise, &case.case_id, SignalKind::Qa, &key);
        let (answer, noisy) = sample(&mut self.rng, canonical, &variants, noise);

        let state = self.state.as_mut().expect("checked in step");
        state.known_facts.insert(key.clone(), answer.clone());
        state.history.push(format!("ask:{key}"));
        tracing::debug!(question = %key, noisy, "question answered");

        Ok(ActionResult {
            kind: ActionKind::AskQuestion,
            observation: answer,
            noisy,
            available_tests: Vec::new(),
        })
    }

    fn run_test(&mut self, test: &str) -> Result<ActionResult> {
        let test = test.trim().to_lowercase();
        let case = self.case.as_ref().expect("checked in step");
        let available = case.available_tests();

        let Some(canonical) = case.tests.get(&test).cloned() else {
            let state = self.state.as_mut().expect("checked in step");
            state.history.push(format!("test:{test}"));
            return Ok(ActionResult {
                kind: ActionKind::OrderTest,
                observation: TEST_UNAVAILABLE.into(),
                noisy: false,
                available_tests: available,
            });
        };

        let variants = self.catalog.test_variants(&case.case_id, &test).to_vec();
        let noise = self.noise_profile.resolve(
            self.observation_noise,
            &case.case_id,
            SignalKind::Test,
            &test,
        );
        let (result, noisy) = sample(&mut self.rng, canonical, &variants, noise);

        let state = self.state.as_mut().expect("checked in step");
        state.completed_tests.insert(test.clone(), result.clone());
        state.history.push(format!("test:{test}"));
        tracing::debug!(test = %test, noisy, "test completed");

        Ok(ActionResult {
            kind: ActionKind::OrderTest,
            observation: result,
            noisy,
            available_tests: available,
        })
    }

    fn evaluate_recommendation(&mut self, diagnosis: &str) -> Result<ActionResult> {
        let case = self.case.as_ref().expect("checked in step");
        let proposed = diagnosis.trim().to_lowercase();
        let target = case.final_diagnosis.to_lowercase();

        // Bidirectional substring match so a more or less specific label on
        // either side still counts as consistent.
        let consistent =
            !proposed.is_empty() && (target.contains(&proposed) || proposed.contains(&target));
        let observation = if consistent {
            PLAN_CONSISTENT
        } else {
            PLAN_INCONSISTENT
        };

        let state = self.state.as_mut().expect("checked in step");
        state.history.push("recommendation_evaluated".into());
        Ok(ActionResult::plain(ActionKind::RecommendPlan, observation))
    }
}

/// Draw a variant with probability `noise` when any variants are registered,
/// otherwise return the canonical value.
fn sample(
    rng: &mut StdRng,
    canonical: String,
    variants: &[String],
    noise: f64,
) -> (String, bool) {
    if !variants.is_empty() && rng.gen::<f64>() < noise {
        let pick = rng.gen_range(0..variants.len());
        return (variants[pick].clone(), true);
    }
    (canonical, false)
}
