//! Async task poller
//!
//! Drives any [`AsyncPort`] from `submit` to a terminal status:
//!
//! ```text
//! submit ──▶ wait(interval) ──▶ poll ──┬─ Pending ──────────▶ wait again (≤ max_attempts)
//!                                      ├─ Succeeded(Some) ──▶ Ok(output)
//!                                      ├─ Succeeded(None) ──▶ Err(Protocol)
//!                                      └─ Failed(msg) ──────▶ Err(TaskFailed)
//! ```
//!
//! The interval is fixed. Exhausting the attempts yields `TaskTimeout`.

use super::shared::{cancellable, cancellable_sleep, check_cancelled};
use crate::ports::inference::{AsyncPort, InferenceError};
use mmagent_domain::{Task, TaskStatus};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Poll timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }
}

impl PollerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskPoller {
    config: PollerConfig,
}

impl TaskPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Submit `input` and poll until the task reaches a terminal status.
    pub async fn run<I, O>(
        &self,
        port: &dyn AsyncPort<I, O>,
        input: &I,
        cancel: &CancellationToken,
    ) -> Result<O, InferenceError>
    where
        I: Send + Sync + 'static,
        O: Send + 'static,
    {
        check_cancelled(cancel)?;
        let task_id = cancellable(cancel, port.submit(input)).await?;
        let mut task = Task::new(task_id);
        info!(
            task_id = %task.task_id,
            provider = %port.provider(),
            "Submitted async task"
        );

        while task.attempts < self.config.max_attempts {
            cancellable_sleep(cancel, self.config.interval).await?;
            let attempt = task.record_attempt();
            let status = cancellable(cancel, port.poll(&task.task_id)).await?;
            debug!(task_id = %task.task_id, attempt, "Polled async task");

            match status {
                TaskStatus::Pending => continue,
                TaskStatus::Succeeded(Some(output)) => {
                    info!(
                        task_id = %task.task_id,
                        attempts = attempt,
                        elapsed_ms = task.elapsed().as_millis() as u64,
                        "Async task succeeded"
                    );
                    return Ok(output);
                }
                TaskStatus::Succeeded(None) => {
                    return Err(InferenceError::Protocol(format!(
                        "task {} succeeded without output",
                        task.task_id
                    )));
                }
                TaskStatus::Failed(message) => {
                    warn!(task_id = %task.task_id, %message, "Async task failed");
                    return Err(InferenceError::TaskFailed(message));
                }
            }
        }

        warn!(
            task_id = %task.task_id,
            attempts = task.attempts,
            "Async task did not finish in time"
        );
        Err(InferenceError::TaskTimeout {
            attempts: task.attempts,
        })
    }
}
