//! Application layer for mmagent
//!
//! This crate contains port definitions and use cases. It depends only on
//! the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    approval::{ApprovalChannel, ApprovalError, NoApprovalChannel},
    artifact_store::{ArtifactError, ArtifactStore},
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    inference::{
        AsyncPort, ImageEditPort, ImagePort, InferenceError, InferencePort, SpeechPort,
        SyncPort, TextPort, VisionPort,
    },
    line_ledger::LineLedger,
    media::MediaDownloader,
    tool_executor::{Tool, ToolExecutorPort, ToolInvocationError},
};
pub use use_cases::{
    approval::ApprovalBroker,
    poll_task::{PollerConfig, TaskPoller},
    retry::{RetryPolicy, RetryingSyncPort},
    run_context::{RunContextPropagator, RunGuard},
    shared::{cancellable, cancellable_sleep},
};
