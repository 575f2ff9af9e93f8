//! Approval request/response entities and the payload merge rule.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──▶ AwaitingApproval ──┬──▶ Approved  (response.approved = true)
//!                                ├──▶ Denied    (response.approved = false)
//!                                └──▶ TimedOut  (no response in time)
//! ```
//!
//! Terminal states are consumed exactly once.

use super::policy::Priority;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use uuid::Uuid;

/// JSON object carried by approvals.
pub type Payload = Map<String, Value>;

/// Correlates a pushed request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Fresh random id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Approval lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Created,
    AwaitingApproval,
    Approved,
    Denied,
    TimedOut,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::Created => "created",
            ApprovalState::AwaitingApproval => "awaiting_approval",
            ApprovalState::Approved => "approved",
            ApprovalState::Denied => "denied",
            ApprovalState::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApprovalState::Approved | ApprovalState::Denied | ApprovalState::TimedOut
        )
    }
}

/// A request for consent, pushed to the external actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub request_id: RequestId,
    pub action_type: String,
    pub payload: Payload,
    pub priority: Priority,
    /// How long the broker waits before giving up, in milliseconds.
    pub timeout_ms: u64,
    /// Run (thread) that raised the request, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl ApprovalRequest {
    pub fn new(action_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            request_id: RequestId::generate(),
            action_type: action_type.into(),
            payload,
            priority: Priority::Medium,
            timeout_ms: 0,
            thread_id: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The external actor's answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// User edits; merged over the request payload when approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl ApprovalResponse {
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
            payload: None,
        }
    }

    pub fn approve_with_edits(payload: Payload) -> Self {
        Self {
            approved: true,
            reason: None,
            payload: Some(payload),
        }
    }

    pub fn deny(reason: Option<String>) -> Self {
        Self {
            approved: false,
            reason,
            payload: None,
        }
    }
}

/// What the requesting tool gets back.
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalOutcome {
    /// Proceed using this payload (request payload with user edits merged in).
    Approved(Payload),
    /// The user declined. Not an error.
    Denied { reason: Option<String> },
}

impl ApprovalOutcome {
    /// Resolve a response against the request it answers.
    pub fn from_response(request_payload: &Payload, response: ApprovalResponse) -> Self {
        if response.approved {
            ApprovalOutcome::Approved(merge_payload(request_payload, response.payload.as_ref()))
        } else {
            ApprovalOutcome::Denied {
                reason: response
                    .reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
            }
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalOutcome::Approved(_))
    }

    pub fn state(&self) -> ApprovalState {
        match self {
            ApprovalOutcome::Approved(_) => ApprovalState::Approved,
            ApprovalOutcome::Denied { .. } => ApprovalState::Denied,
        }
    }
}

/// Field-level merge: response fields override, everything else passes through.
pub fn merge_payload(request: &Payload, response: Option<&Payload>) -> Payload {
    let mut merged = request.clone();
    if let Some(edits) = response {
        for (key, value) in edits {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
