//! Audit event sink.
//!
//! The core emits structured (event type, payload) pairs; timestamping, PII
//! redaction, and persistence are the sink's responsibility. The core never
//! inspects sink behavior beyond "accepts a write".

use std::sync::{Mutex, PoisonError};

/// Event types the session registry emits.
pub mod events {
    pub const SESSION_START: &str = "session_start";
    pub const CHAT_TURN: &str = "chat_turn";
    pub const SESSION_EXPIRED: &str = "session_expired";
    pub const SESSION_DELETED: &str = "session_deleted";
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event_type: &str, payload: serde_json::Value);
}

/// Sink that discards every event.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event_type: &str, _payload: serde_json::Value) {}
}

/// Sink that buffers events in memory; used in tests and small tools.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in emission order.
    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event types only, in emission order.
    pub fn event_types(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|(event_type, _)| event_type)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event_type: &str, payload: serde_json::Value) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event_type.to_string(), payload));
    }
}
