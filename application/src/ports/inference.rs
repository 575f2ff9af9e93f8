//! Inference ports
//!
//! Capability-shaped interfaces that provider adapters satisfy. A port is
//! either **sync** ([`SyncPort::execute`], one round trip) or **async**
//! ([`AsyncPort::submit`] then [`AsyncPort::poll`]). Vendor details never
//! leak through these traits; implementations live in the infrastructure
//! layer.

use async_trait::async_trait;
use mmagent_domain::{
    ImageEditInput, ImageGenInput, Provider, SpeechInput, SpeechOutput, TaskId, TaskStatus, TextInput,
    VisionInput,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by ports, the task poller and the retry policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// Unsupported or unconfigured `(capability, provider)`; raised at wiring time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-2xx response from the provider.
    #[error("Provider error: {status} {status_text}: {body}")]
    Provider {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 2xx response that lacks the expected fields.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Task did not finish after {attempts} polls")]
    TaskTimeout { attempts: u32 },

    /// Network-level failure (DNS, connect, TLS, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl InferenceError {
    /// Rate limited or temporarily unavailable (HTTP 429 / 503).
    pub fn is_transient(&self) -> bool {
        matches!(self, InferenceError::Provider { status: 429 | 503, .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, InferenceError::Cancelled)
    }
}

/// One round trip per call.
#[async_trait]
pub trait SyncPort<I, O>: Send + Sync
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    /// Vendor behind this port (for logs).
    fn provider(&self) -> Provider;

    async fn execute(&self, input: &I) -> Result<O, InferenceError>;
}

/// Submit-then-poll protocol for long-running operations.
#[async_trait]
pub trait AsyncPort<I, O>: Send + Sync
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    fn provider(&self) -> Provider;

    /// Start the operation. Fails with `Protocol` if no task id comes back.
    async fn submit(&self, input: &I) -> Result<TaskId, InferenceError>;

    /// One status check. Never waits or loops.
    async fn poll(&self, task_id: &TaskId) -> Result<TaskStatus<O>, InferenceError>;
}

/// Image + prompt in, text out.
pub type VisionPort = dyn SyncPort<VisionInput, String>;
/// Chat completion.
pub type TextPort = dyn SyncPort<TextInput, String>;
/// Text in, audio out.
pub type SpeechPort = dyn SyncPort<SpeechInput, SpeechOutput>;
/// Prompt in, image URL out.
pub type ImagePort = dyn AsyncPort<ImageGenInput, String>;
/// Prompt and reference images in, edited image URL out. Adapters that
/// submit and poll internally still present a single round trip.
pub type ImageEditPort = dyn SyncPort<ImageEditInput, String>;

/// A port of either protocol, as returned by the port factory.
#[derive(Clone)]
pub enum InferencePort {
    Vision(Arc<VisionPort>),
    Text(Arc<TextPort>),
    Speech(Arc<SpeechPort>),
    Image(Arc<ImagePort>),
}

impl InferencePort {
    pub fn provider(&self) -> Provider {
        match self {
            InferencePort::Vision(p) => p.provider(),
            InferencePort::Text(p) => p.provider(),
            InferencePort::Speech(p) => p.provider(),
            InferencePort::Image(p) => p.provider(),
        }
    }
}

impl std::fmt::Debug for InferencePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            InferencePort::Vision(_) => "Vision",
            InferencePort::Text(_) => "Text",
            InferencePort::Speech(_) => "Speech",
            InferencePort::Image(_) => "Image",
        };
        write!(f, "InferencePort::{}({})", kind, self.provider())
    }
}
