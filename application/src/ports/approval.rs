//! Approval channel port
//!
//! The broker pushes [`ApprovalRequest`]s out through an [`ApprovalChannel`];
//! answers come back separately via `ApprovalBroker::respond`, correlated by
//! request id. The channel only has to deliver, never to wait.

use mmagent_domain::ApprovalRequest;
use std::time::Duration;
use thiserror::Error;

/// Errors from the approval flow. A denial is not one of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("No answer for {action_type} after {after:?}")]
    Timeout { action_type: String, after: Duration },

    #[error("Approval channel closed")]
    ChannelClosed,

    #[error("Approval cancelled")]
    Cancelled,
}

/// Outbound half of the approval transport.
pub trait ApprovalChannel: Send + Sync {
    /// Deliver a request to whoever answers approvals.
    ///
    /// Fails with `ChannelClosed` when no consumer can ever see it.
    fn push(&self, request: &ApprovalRequest) -> Result<(), ApprovalError>;
}

/// Channel with no consumer; every request resolves through its timeout.
pub struct NoApprovalChannel;

impl ApprovalChannel for NoApprovalChannel {
    fn push(&self, _request: &ApprovalRequest) -> Result<(), ApprovalError> {
        Ok(())
    }
}
