//! Encounter-Sim Core Library
//!
//! Multi-turn simulated clinical encounters: a caller repeatedly asks
//! questions, orders tests, or requests a recommendation against a scripted
//! patient vignette, and gets back an observation, an evolving diagnosis, a
//! safety assessment, and a human-handoff decision.
//!
//! # Architecture
//!
//! ```text
//! caller ──► SessionRegistry ──► Turn Pipeline
//!            (TTL + capacity)         │
//!                 ┌───────────────────┼───────────────────┐
//!                 ▼                   ▼                   ▼
//!           DecisionEngine ──►   WorldModel   ──►    SafetyGate
//!           (cluster table)   (seeded sampling)   (red flags, handoff)
//!                                     │
//!                                     ▼
//!                            GuidelineRetriever
//!                            (token-overlap rank)
//! ```
//!
//! # Core principle
//!
//! **Doubt defaults to handoff.** A red flag, a dangerous-miss pattern, an
//! unsupported diagnosis, or low confidence always escalates to a human
//! instead of asserting a diagnosis.
//!
//! # Modules
//!
//! - [`cases`]: immutable catalog of scripted vignettes and variant pools
//! - [`models`]: domain types (PatientCase, ObservedState, TurnResult, ...)
//! - [`world`]: per-session stochastic world model with layered noise
//! - [`engine`]: data-driven diagnostic decision engine
//! - [`safety`]: red-flag evaluation and escalate/refuse gating
//! - [`knowledge`]: lexical-overlap guideline retriever
//! - [`session`]: concurrency-safe session registry and turn pipeline
//! - [`audit`]: structured audit-event sink trait

pub mod audit;
pub mod cases;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod safety;
pub mod session;
pub mod world;

// Re-export commonly used types
pub use audit::{AuditSink, MemoryAuditSink, NullAuditSink};
pub use cases::CaseCatalog;
pub use engine::{DecisionEngine, PathwayProgress, INSUFFICIENT_EVIDENCE};
pub use error::{Error, Result};
pub use knowledge::{GuidelineDoc, GuidelineHit, GuidelineRetriever};
pub use models::{
    Action, ActionKind, ActionResult, ObservedState, PatientCase, TurnResult, Urgency,
};
pub use safety::{HandoffDecision, SafetyAssessment, SafetyGate};
pub use session::{RegistryConfig, SessionOptions, SessionRegistry, SessionSummary};
pub use world::{NoiseProfile, WorldConfig, WorldModel};
