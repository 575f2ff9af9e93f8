//! Port for the structured audit trail.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics, while
//! this port records approval lifecycle events in a machine-readable form
//! (one JSONL line per event in the default adapter).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A structured audit event.
pub struct AuditEvent {
    /// Event type identifier (e.g., "hitl_requested", "hitl_timeout").
    pub event_type: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Event-specific fields.
    pub payload: Value,
}

impl AuditEvent {
    /// Create an event stamped with the current UTC time.
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Port for recording audit events.
///
/// `log` is synchronous and infallible; a failing sink must not disturb the
/// flow being audited.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
