//! Domain layer for mmagent
//!
//! This crate contains the pure types shared by every layer. It has no
//! dependencies on I/O, async runtimes or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Inference
//!
//! A [`Capability`] (vision, text, text-to-image, text-to-speech) is served
//! by a [`Provider`]. Each capability has one [`Protocol`]:
//!
//! - **Sync**: one request, one response
//! - **Async**: submit a task, then poll its [`TaskStatus`] until terminal
//!
//! ## Human-in-the-loop approval
//!
//! Side-effecting tool actions are gated by an [`HitlPolicy`]. An
//! [`ApprovalRequest`] is answered by an [`ApprovalResponse`]; user edits are
//! merged over the request payload with [`merge_payload`].
//!
//! ## Run context
//!
//! A [`RunContext`] carries thread/message/tool-call ids and a progress
//! callback down to tool code.

pub mod approval;
pub mod artifact;
pub mod core;
pub mod inference;
pub mod run_context;
pub mod tool;

// Re-export commonly used types
pub use approval::{
    entities::{
        ApprovalOutcome, ApprovalRequest, ApprovalResponse, ApprovalState, Payload, RequestId,
        merge_payload,
    },
    policy::{HitlAction, HitlPolicy, HitlRule, Priority, PriorityTimeouts},
};
pub use artifact::{
    ArtifactEntry, ArtifactKind, FIRST_LINE_NUMBER, LineEntry, LineRecord,
};
pub use core::error::DomainError;
pub use inference::{
    capability::{Capability, Protocol, Provider},
    io::{
        ChatMessage, ChatRole, ImageEditInput, ImageGenInput, SpeechInput, SpeechOutput,
        TextInput, VisionInput,
    },
    task::{Task, TaskId, TaskStatus},
};
pub use run_context::{ProgressCallback, ProgressEvent, RunContext};
pub use tool::{
    ToolCall, ToolDefinition, ToolError, ToolParameter, ToolResult, ToolResultMetadata,
    ToolStatus,
};
