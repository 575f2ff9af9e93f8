//! Approval transport adapters

mod channel;

pub use channel::MpscApprovalChannel;
