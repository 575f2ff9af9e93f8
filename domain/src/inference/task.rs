//! Async task value objects.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Vendor-issued identifier of an in-flight async operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a single `poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus<T> {
    /// Queued or running.
    Pending,
    /// Vendor reported success. `None` when the expected output field is missing.
    Succeeded(Option<T>),
    /// Vendor reported failure, with its message.
    Failed(String),
}

impl<T> TaskStatus<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

/// Caller-held handle to an async task for the lifetime of one poll loop.
#[derive(Debug, Clone)]
pub struct Task {
    pub task_id: TaskId,
    pub attempts: u32,
    pub started_at: Instant,
}

impl Task {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            attempts: 0,
            started_at: Instant::now(),
        }
    }

    /// Record one more poll and return the new attempt number (1-based).
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
