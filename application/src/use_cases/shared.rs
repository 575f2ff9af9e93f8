//! Shared utilities for use cases.
//!
//! Cancellation helpers used by the task poller, the retry policy and the
//! tools.

use crate::ports::inference::InferenceError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), InferenceError> {
    if token.is_cancelled() {
        return Err(InferenceError::Cancelled);
    }
    Ok(())
}

/// Await `fut` unless `token` fires first.
///
/// The losing future is dropped, which aborts any in-flight request it owns.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, InferenceError>
where
    F: Future<Output = Result<T, InferenceError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(InferenceError::Cancelled),
        result = fut => result,
    }
}

/// Sleep for `duration` unless `token` fires first.
pub async fn cancellable_sleep(
    token: &CancellationToken,
    duration: std::time::Duration,
) -> Result<(), InferenceError> {
    cancellable(token, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancellable_passes_through() {
        let token = CancellationToken::new();
        let value = cancellable(&token, async { Ok::<_, InferenceError>(7) }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn test_cancellable_prefers_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let value = cancellable(&token, async { Ok::<_, InferenceError>(7) }).await;
        assert_eq!(value, Err(InferenceError::Cancelled));
        assert_eq!(check_cancelled(&token), Err(InferenceError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_sleep_interrupted() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });
        let started = tokio::time::Instant::now();
        let result = cancellable_sleep(&token, Duration::from_secs(60)).await;
        assert_eq!(result, Err(InferenceError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
