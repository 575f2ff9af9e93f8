//! Task polling, retry and speech pacing settings (`[poller]`, `[retry]`, `[speech]`)

use mmagent_application::{PollerConfig, RetryPolicy};
use mmagent_domain::FIRST_LINE_NUMBER;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePollerConfig {
    /// Wait before each status check
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for FilePollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 60,
        }
    }
}

impl FilePollerConfig {
    pub fn to_poller_config(&self) -> PollerConfig {
        PollerConfig::default()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_max_attempts(self.max_attempts)
    }
}

/// Backoff for transient provider rejections (429 / 503)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_retries: u32,
    /// First delay; doubles on every retry
    pub base_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_ms: 5000,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_ms))
    }
}

/// Speech synthesis pacing and line numbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpeechConfig {
    /// Pause before every line after the first
    pub rate_limit_ms: u64,
    /// Number for the first line in a fresh workspace
    pub first_line_number: u32,
}

impl Default for FileSpeechConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: 2000,
            first_line_number: FIRST_LINE_NUMBER,
        }
    }
}

impl FileSpeechConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}
