//! Tool domain module
//!
//! A tool is what the orchestration engine calls by name. Each tool is
//! described by a [`ToolDefinition`], invoked with a [`ToolCall`] and ends in
//! a [`ToolResult`].
//!
//! ```text
//! ┌────────────────┐    ┌──────────────┐    ┌──────────────────────────┐
//! │ ToolDefinition │───▶│ ToolCall     │───▶│ ToolResult               │
//! │ (+ HITL action)│    │ (invocation) │    │ success|cancelled|failure│
//! └────────────────┘    └──────────────┘    └──────────────────────────┘
//! ```
//!
//! Tools with an `action_type` ask the approval broker before doing anything
//! with side effects. A denial becomes a *cancelled* result, not an error.

pub mod entities;
pub mod value_objects;

pub use entities::{ToolCall, ToolDefinition, ToolParameter};
pub use value_objects::{ToolError, ToolResult, ToolResultMetadata, ToolStatus};
