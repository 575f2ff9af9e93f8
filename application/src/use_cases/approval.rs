//! Human-in-the-loop approval broker
//!
//! Suspends a tool until an external actor answers its [`ApprovalRequest`].
//!
//! # Flow
//!
//! ```text
//! request_approval(action, payload)
//!        │
//!        ├─ policy says no approval needed ──▶ Approved(payload)
//!        ▼
//! register oneshot in pending table (request_id → sender)
//!        │
//!        ▼
//! ApprovalChannel::push(request) ─── external actor ───▶ respond(request_id, response)
//!        │                                                      │
//!        ▼                                                      │
//! wait: response │ timeout │ cancellation  ◀────────────────────┘
//! ```
//!
//! The pending entry is removed exactly once on every path. `respond` does an
//! atomic lookup-and-remove, so the first responder wins and later answers
//! for the same id are dropped.

use crate::ports::approval::{ApprovalChannel, ApprovalError};
use crate::ports::audit_logger::{AuditEvent, AuditLogger};
use mmagent_domain::{
    ApprovalOutcome, ApprovalRequest, ApprovalResponse, HitlAction, HitlPolicy, Payload,
    RequestId,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reason attached when a request is cancelled from the outside.
pub const CANCELLED_BY_USER: &str = "Cancelled by user";
/// Reason attached when a run is released.
pub const RUN_RELEASED: &str = "Run cancelled";

struct PendingApproval {
    request: ApprovalRequest,
    sender: oneshot::Sender<ApprovalResponse>,
}

type PendingTable = Mutex<HashMap<RequestId, PendingApproval>>;

/// Removes the pending entry when the waiting future finishes or is dropped.
struct PendingGuard<'a> {
    pending: &'a PendingTable,
    request_id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.remove(&self.request_id).is_some() {
            debug!(request_id = %self.request_id, "Released pending approval");
        }
    }
}

pub struct ApprovalBroker {
    policy: HitlPolicy,
    channel: Arc<dyn ApprovalChannel>,
    audit: Arc<dyn AuditLogger>,
    pending: PendingTable,
}

impl ApprovalBroker {
    pub fn new(
        policy: HitlPolicy,
        channel: Arc<dyn ApprovalChannel>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self {
            policy,
            channel,
            audit,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &HitlPolicy {
        &self.policy
    }

    /// Ask for consent to perform `action_type` with `payload`.
    ///
    /// Resolves to `Approved` with the merged payload or `Denied` with the
    /// user's reason. Timeouts, cancellation and a dead channel are errors.
    pub async fn request_approval(
        &self,
        action_type: &str,
        payload: Payload,
        thread_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        let (priority, timeout, auto_approve) = match self.policy.evaluate(action_type) {
            HitlAction::PassThrough => {
                debug!(action_type, "No approval required");
                return Ok(ApprovalOutcome::Approved(payload));
            }
            HitlAction::RequestApproval {
                priority,
                timeout,
                auto_approve_on_timeout,
            } => (priority, timeout, auto_approve_on_timeout),
        };

        if cancel.is_cancelled() {
            return Err(ApprovalError::Cancelled);
        }

        let mut request = ApprovalRequest::new(action_type, payload)
            .with_priority(priority)
            .with_timeout(timeout);
        if let Some(thread_id) = thread_id {
            request = request.with_thread_id(thread_id);
        }
        let request_id = request.request_id.clone();

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.insert(
                request_id.clone(),
                PendingApproval {
                    request: request.clone(),
                    sender: tx,
                },
            );
        }
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id: request_id.clone(),
        };

        self.channel.push(&request)?;
        info!(
            request_id = %request_id,
            action_type,
            priority = %priority,
            timeout_ms = request.timeout_ms,
            "Awaiting approval"
        );
        self.audit.log(AuditEvent::new(
            "hitl_requested",
            json!({
                "request_id": request_id.as_str(),
                "action_type": action_type,
                "priority": priority.as_str(),
                "timeout_ms": request.timeout_ms,
                "thread_id": request.thread_id,
            }),
        ));

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(request_id = %request_id, action_type, "Approval cancelled");
                return Err(ApprovalError::Cancelled);
            }
            waited = tokio::time::timeout(timeout, rx) => waited,
        };

        match waited {
            Ok(Ok(response)) => {
                let outcome = ApprovalOutcome::from_response(&request.payload, response);
                info!(
                    request_id = %request_id,
                    action_type,
                    approved = outcome.is_approved(),
                    "Approval resolved"
                );
                self.audit.log(AuditEvent::new(
                    "hitl_resolved",
                    json!({
                        "request_id": request_id.as_str(),
                        "action_type": action_type,
                        "state": outcome.state().as_str(),
                    }),
                ));
                Ok(outcome)
            }
            // Sender dropped without an answer.
            Ok(Err(_)) => Err(ApprovalError::ChannelClosed),
            Err(_) => {
                self.audit.log(AuditEvent::new(
                    "hitl_timeout",
                    json!({
                        "request_id": request_id.as_str(),
                        "action_type": action_type,
                        "after_ms": request.timeout_ms,
                        "auto_approved": auto_approve,
                    }),
                ));
                if auto_approve {
                    info!(request_id = %request_id, action_type, "Approval timed out, auto-approving");
                    Ok(ApprovalOutcome::Approved(request.payload))
                } else {
                    warn!(request_id = %request_id, action_type, "Approval timed out");
                    Err(ApprovalError::Timeout {
                        action_type: action_type.to_string(),
                        after: timeout,
                    })
                }
            }
        }
    }

    /// Deliver the answer for `request_id`.
    ///
    /// Returns `false` for unknown or already-resolved ids; such answers are
    /// dropped.
    pub fn respond(&self, request_id: &RequestId, response: ApprovalResponse) -> bool {
        let entry = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(request_id)
        };
        match entry {
            Some(entry) => entry.sender.send(response).is_ok(),
            None => {
                debug!(request_id = %request_id, "Ignoring response for unknown request");
                false
            }
        }
    }

    /// Snapshot of requests still waiting for an answer.
    pub fn pending_requests(&self) -> Vec<ApprovalRequest> {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.values().map(|p| p.request.clone()).collect()
    }

    /// Resolve `request_id` as denied by the user.
    pub fn cancel_request(&self, request_id: &RequestId) -> bool {
        self.respond(
            request_id,
            ApprovalResponse::deny(Some(CANCELLED_BY_USER.to_string())),
        )
    }

    /// Deny every pending request raised by `thread_id`. Returns how many.
    pub fn release_run(&self, thread_id: &str) -> usize {
        let released: Vec<PendingApproval> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let ids: Vec<RequestId> = pending
                .iter()
                .filter(|(_, p)| p.request.thread_id.as_deref() == Some(thread_id))
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| pending.remove(id)).collect()
        };
        let count = released.len();
        for entry in released {
            let _ = entry
                .sender
                .send(ApprovalResponse::deny(Some(RUN_RELEASED.to_string())));
        }
        if count > 0 {
            info!(thread_id, count, "Released pending approvals for run");
        }
        count
    }
}
