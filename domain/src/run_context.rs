//! Per-run metadata handed to tool-level code.

use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub current: usize,
    pub total: usize,
    /// Artifact produced by this step (relative path).
    pub path: String,
}

/// Callback receiving progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Metadata for one agent run, refined at each tool-call boundary.
#[derive(Clone)]
pub struct RunContext {
    pub thread_id: String,
    pub message_id: Option<String>,
    pub tool_call_id: Option<String>,
    pub on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("thread_id", &self.thread_id)
            .field("message_id", &self.message_id)
            .field("tool_call_id", &self.tool_call_id)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl RunContext {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            message_id: None,
            tool_call_id: None,
            on_progress: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Invoke the progress callback, if any.
    ///
    /// Returns `false` when the callback panicked. The panic is contained so
    /// the operation reporting progress keeps going.
    pub fn report(&self, current: usize, total: usize, path: impl Into<String>) -> bool {
        let Some(callback) = &self.on_progress else {
            return true;
        };
        let event = ProgressEvent {
            thread_id: self.thread_id.clone(),
            message_id: self.message_id.clone(),
            tool_call_id: self.tool_call_id.clone(),
            current,
            total,
            path: path.into(),
        };
        catch_unwind(AssertUnwindSafe(|| callback(event))).is_ok()
    }
}
