//! Tool ports
//!
//! A [`Tool`] is one invocable unit built by a factory that closes over its
//! inference port, the approval broker and the run-context propagator. The
//! orchestration engine never sees tools directly; it goes through a
//! [`ToolExecutorPort`] (the tool registry in the infrastructure layer).

use super::approval::ApprovalError;
use super::artifact_store::ArtifactError;
use super::inference::InferenceError;
use async_trait::async_trait;
use mmagent_domain::{ToolCall, ToolDefinition, ToolError, ToolResult};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a tool invocation could not complete.
#[derive(Error, Debug, Clone)]
pub enum ToolInvocationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Tool cancelled")]
    Cancelled,
}

impl ToolInvocationError {
    /// Map onto the tool-result error codes.
    pub fn to_tool_error(&self) -> ToolError {
        match self {
            ToolInvocationError::InvalidArgument(msg) => ToolError::invalid_argument(msg.clone()),
            ToolInvocationError::Approval(ApprovalError::Timeout { action_type, .. }) => {
                ToolError::timeout(format!("approval for {}", action_type))
            }
            ToolInvocationError::Artifact(ArtifactError::InvalidPath(path)) => {
                ToolError::permission_denied(path.clone())
            }
            ToolInvocationError::Artifact(ArtifactError::NotFound(path)) => {
                ToolError::not_found(path.clone())
            }
            other => ToolError::execution_failed(other.to_string()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ToolInvocationError::Cancelled
                | ToolInvocationError::Approval(ApprovalError::Cancelled)
                | ToolInvocationError::Inference(InferenceError::Cancelled)
        )
    }
}

/// A single tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    /// Run the tool. A user denial is an `Ok` cancelled result, not an error.
    async fn invoke(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolInvocationError>;
}

/// Port for executing tools by name.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Definitions of all enabled tools
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn has_tool(&self, name: &str) -> bool {
        self.definitions().iter().any(|d| d.name == name)
    }

    /// Execute a tool call. Never fails; errors become failed results.
    async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolResult;
}
