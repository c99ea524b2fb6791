//! Session registry.
//!
//! Owns every live session bundle and hands out opaque identifiers; all
//! mutation happens through registry-mediated access, so no caller retains a
//! durable reference to a bundle's internals. Every operation first evicts
//! expired sessions under the registry lock, keeping the capacity and TTL
//! invariants exact under concurrent callers.

mod pipeline;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{events, AuditSink};
use crate::cases::CaseCatalog;
use crate::engine::{DecisionEngine, PathwayProgress};
use crate::error::{Error, Result};
use crate::knowledge::{GuidelineDoc, GuidelineRetriever};
use crate::models::{ObservedState, TurnResult};
use crate::safety::SafetyGate;
use crate::world::{NoiseProfile, WorldConfig, WorldModel};

/// Registry-wide limits.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Idle time after which a session becomes unreachable
    pub session_ttl: Duration,
    /// Maximum number of live sessions
    pub max_sessions: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(1800),
            max_sessions: 100,
        }
    }
}

/// Per-session start options. Deserializable so callers can pass them
/// straight from request or config JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Seed for the session's observation generator; entropy when absent
    pub seed: Option<u64>,
    /// Base observation-noise probability
    pub observation_noise: f64,
    /// Layered noise overrides
    pub noise_profile: NoiseProfile,
    /// Guideline hits requested per turn
    pub evidence_top_k: usize,
    /// Refusal threshold on diagnosis confidence
    pub min_confidence: f64,
    /// Externally loaded guideline corpus; compiled-in corpus when absent
    pub corpus: Option<Vec<GuidelineDoc>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            observation_noise: 0.15,
            noise_profile: NoiseProfile::default(),
            evidence_top_k: 3,
            min_confidence: 0.5,
            corpus: None,
        }
    }
}

/// Lightweight view of a live session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub case_id: String,
    pub created_at: DateTime<Utc>,
    pub turn_count: usize,
}

/// Everything owned by one session: the world model plus the per-session
/// engine, gate, and retriever instances, and the turn history.
pub(crate) struct SessionBundle {
    pub(crate) session_id: String,
    pub(crate) case_id: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_access: Instant,
    pub(crate) world: WorldModel,
    pub(crate) engine: DecisionEngine,
    pub(crate) gate: SafetyGate,
    pub(crate) retriever: GuidelineRetriever,
    pub(crate) evidence_top_k: usize,
    pub(crate) turns: Vec<TurnResult>,
}

/// Concurrency-safe session registry with TTL eviction and capacity
/// admission control. One mutex serializes the eviction scan, the count
/// check, and every insertion/removal. Chat turns run under it too, so each
/// session sees at most one in-flight turn.
pub struct SessionRegistry {
    catalog: Arc<CaseCatalog>,
    audit: Arc<dyn AuditSink>,
    config: RegistryConfig,
    sessions: Mutex<HashMap<String, SessionBundle>>,
}

impl SessionRegistry {
    pub fn new(
        catalog: Arc<CaseCatalog>,
        audit: Arc<dyn AuditSink>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            catalog,
            audit,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a session against a case. Fails with `CapacityExceeded` when the
    /// registry is full and `NotFound` for an unknown case; nothing is
    /// registered on failure.
    pub fn start_session(&self, case_id: &str, options: SessionOptions) -> Result<String> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);

        if sessions.len() >= self.config.max_sessions {
            return Err(Error::CapacityExceeded(self.config.max_sessions));
        }

        let mut world = WorldModel::new(
            self.catalog.clone(),
            WorldConfig {
                seed: options.seed,
                observation_noise: options.observation_noise,
                noise_profile: options.noise_profile,
            },
        );
        world.reset(case_id, options.seed)?;

        let retriever = match options.corpus {
            Some(docs) => GuidelineRetriever::with_docs(docs),
            None => GuidelineRetriever::new(),
        };
        let bundle = SessionBundle {
            session_id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            created_at: Utc::now(),
            last_access: Instant::now(),
            world,
            engine: DecisionEngine::new(),
            gate: SafetyGate::new(options.min_confidence),
            retriever,
            evidence_top_k: options.evidence_top_k.max(1),
            turns: Vec::new(),
        };

        let session_id = bundle.session_id.clone();
        self.audit.record(
            events::SESSION_START,
            serde_json::json!({
                "session_id": session_id,
                "case_id": case_id,
                "observation_noise": options.observation_noise,
                "evidence_top_k": bundle.evidence_top_k,
            }),
        );
        tracing::info!(session_id = %session_id, case_id, "session started");
        sessions.insert(session_id.clone(), bundle);
        Ok(session_id)
    }

    /// Process one chat turn and append it to the session history.
    pub fn chat(&self, session_id: &str, user_message: &str) -> Result<TurnResult> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let bundle = Self::get_mut(&mut sessions, session_id)?;
        bundle.last_access = Instant::now();

        let turn = pipeline::run_turn(bundle, user_message)?;
        bundle.turns.push(turn.clone());

        self.audit.record(
            events::CHAT_TURN,
            serde_json::json!({
                "session_id": session_id,
                "user_message": user_message,
                "tool": turn.action.kind().as_str(),
                "diagnosis": turn.diagnosis,
                "diagnosis_confidence": turn.diagnosis_confidence,
                "emergency": turn.emergency,
                "refusal": turn.refusal,
                "escalate_to_human": turn.escalate_to_human,
            }),
        );
        tracing::debug!(
            session_id,
            tool = turn.action.kind().as_str(),
            refusal = turn.refusal,
            "chat turn processed"
        );
        Ok(turn)
    }

    /// Defensive copy of the session's observed state.
    pub fn state(&self, session_id: &str) -> Result<ObservedState> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let bundle = Self::get_mut(&mut sessions, session_id)?;
        bundle.last_access = Instant::now();
        bundle.world.state()
    }

    /// Ground-truth label for the session's case; evaluation tooling only.
    pub fn true_diagnosis(&self, session_id: &str) -> Result<String> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let bundle = Self::get_mut(&mut sessions, session_id)?;
        bundle.last_access = Instant::now();
        bundle.world.true_diagnosis().map(|d| d.to_string())
    }

    /// Workup progress for the session's matched cluster.
    pub fn pathway(&self, session_id: &str) -> Result<PathwayProgress> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let bundle = Self::get_mut(&mut sessions, session_id)?;
        bundle.last_access = Instant::now();
        let state = bundle.world.state()?;
        Ok(bundle.engine.pathway_progress(&state))
    }

    /// Full turn history for a session.
    pub fn turns(&self, session_id: &str) -> Result<Vec<TurnResult>> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let bundle = Self::get_mut(&mut sessions, session_id)?;
        Ok(bundle.turns.clone())
    }

    /// Summaries of live sessions, newest first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let mut items: Vec<SessionSummary> = sessions
            .values()
            .map(|b| SessionSummary {
                session_id: b.session_id.clone(),
                case_id: b.case_id.clone(),
                created_at: b.created_at,
                turn_count: b.turns.len(),
            })
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// Remove a session explicitly.
    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        let bundle = sessions
            .remove(session_id)
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;
        self.audit.record(
            events::SESSION_DELETED,
            serde_json::json!({
                "session_id": session_id,
                "case_id": bundle.case_id,
            }),
        );
        tracing::info!(session_id, "session deleted");
        Ok(())
    }

    /// Sorted case identifiers available for new sessions.
    pub fn available_cases(&self) -> Vec<String> {
        self.catalog.case_ids()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionBundle>> {
        // A poisoned lock still holds consistent registry state: every
        // mutation completes before the guard drops.
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn get_mut<'a>(
        sessions: &'a mut HashMap<String, SessionBundle>,
        session_id: &str,
    ) -> Result<&'a mut SessionBundle> {
        sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))
    }

    /// Remove every session idle for at least the TTL, emitting one eviction
    /// event per removal.
    fn evict_expired(&self, sessions: &mut HashMap<String, SessionBundle>) {
        let ttl = self.config.session_ttl;
        let now = Instant::now();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, b)| now.duration_since(b.last_access) >= ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in expired {
            if let Some(bundle) = sessions.remove(&session_id) {
                self.audit.record(
                    events::SESSION_EXPIRED,
                    serde_json::json!({
                        "session_id": session_id,
                        "case_id": bundle.case_id,
                    }),
                );
                tracing::info!(session_id = %session_id, case_id = %bundle.case_id, "session expired");
            }
        }
    }
}
