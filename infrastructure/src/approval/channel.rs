//! In-process approval channel
//!
//! Requests go out over an unbounded tokio mpsc channel to whatever front end
//! answers them (the console approver in the CLI). Answers return through
//! `ApprovalBroker::respond`.

use mmagent_application::{ApprovalChannel, ApprovalError};
use mmagent_domain::ApprovalRequest;
use tokio::sync::mpsc;
use tracing::trace;

pub struct MpscApprovalChannel {
    tx: mpsc::UnboundedSender<ApprovalRequest>,
}

impl MpscApprovalChannel {
    /// Create the channel and the receiver the front end listens on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ApprovalRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ApprovalChannel for MpscApprovalChannel {
    fn push(&self, request: &ApprovalRequest) -> Result<(), ApprovalError> {
        trace!(request_id = %request.request_id, "Pushing approval request");
        self.tx
            .send(request.clone())
            .map_err(|_| ApprovalError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmagent_domain::Payload;

    #[tokio::test]
    async fn test_push_delivers_request() {
        let (channel, mut rx) = MpscApprovalChannel::new();
        let request = ApprovalRequest::new("file.delete", Payload::new());
        channel.push(&request).unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.request_id, request.request_id);
        assert_eq!(received.action_type, "file.delete");
    }

    #[test]
    fn test_push_after_receiver_dropped() {
        let (channel, rx) = MpscApprovalChannel::new();
        drop(rx);
        let err = channel
            .push(&ApprovalRequest::new("x", Payload::new()))
            .unwrap_err();
        assert_eq!(err, ApprovalError::ChannelClosed);
    }
}
