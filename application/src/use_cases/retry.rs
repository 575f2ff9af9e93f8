//! Bounded exponential backoff for sync port calls.
//!
//! Only transient rejections (HTTP 429 / 503) are retried. The wait before
//! retry `n` is `base * 2^(n-1)`, so with the defaults the waits are
//! 5 s, 10 s, 20 s. Attempts never overlap.

use super::shared::{cancellable_sleep, check_cancelled};
use crate::ports::inference::{InferenceError, SyncPort};
use async_trait::async_trait;
use mmagent_domain::Provider;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails permanently or retries run out.
    ///
    /// `op` receives the 1-based attempt number. On exhaustion the last
    /// transient error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, InferenceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let mut attempt = 1;
        loop {
            check_cancelled(cancel)?;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient provider error, backing off"
                    );
                    cancellable_sleep(cancel, delay).await?;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Giving up");
                    return Err(e);
                }
            }
        }
    }
}

/// Applies a [`RetryPolicy`] to every `execute` of the wrapped port.
pub struct RetryingSyncPort<I: Send + Sync + 'static, O: Send + 'static> {
    inner: Arc<dyn SyncPort<I, O>>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<I: Send + Sync + 'static, O: Send + 'static> RetryingSyncPort<I, O> {
    pub fn new(inner: Arc<dyn SyncPort<I, O>>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort backoff waits when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl<I, O> SyncPort<I, O> for RetryingSyncPort<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    fn provider(&self) -> Provider {
        self.inner.provider()
    }

    async fn execute(&self, input: &I) -> Result<O, InferenceError> {
        self.policy
            .run(&self.cancel, |_| self.inner.execute(input))
            .await
    }
}
