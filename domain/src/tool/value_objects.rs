//! Tool result and error value objects
//!
//! Every tool invocation ends in exactly one [`ToolResult`]: success,
//! cancelled (the user denied the action) or failure with a [`ToolError`].
//! Cancellation is not a failure; the engine may carry on with the run.

use serde::{Deserialize, Serialize};

/// Error that occurred during tool execution.
///
/// | Code | Description |
/// |------|-------------|
/// | `INVALID_ARGUMENT` | Missing or malformed arguments |
/// | `NOT_FOUND` | Unknown tool or disabled tool |
/// | `EXECUTION_FAILED` | Inference, storage or download failure |
/// | `PERMISSION_DENIED` | Path outside the workspace |
/// | `TIMEOUT` | No approval answer in time |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Not found: {}", resource.into()))
    }

    pub fn permission_denied(resource: impl Into<String>) -> Self {
        Self::new(
            "PERMISSION_DENIED",
            format!("Permission denied: {}", resource.into()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new("TIMEOUT", format!("Timed out: {}", operation.into()))
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// How a tool invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Cancelled,
    Failure,
}

/// Result of a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub status: ToolStatus,
    /// Output content (success) or the cancellation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(default)]
    pub metadata: ToolResultMetadata,
}

/// Structured metadata about a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Artifacts written or deleted (relative paths)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Success,
            output: Some(output.into()),
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    /// The user denied the action. `reason` is their note, if any.
    pub fn cancelled(tool_name: impl Into<String>, action: &str, reason: Option<&str>) -> Self {
        let message = match reason {
            Some(reason) => format!(
                "{} cancelled by user. User modification: {}",
                action, reason
            ),
            None => format!("{} cancelled by user.", action),
        };
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Cancelled,
            output: Some(message),
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Failure,
            output: None,
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.metadata.paths = paths;
        self
    }

    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.metadata.bytes = Some(bytes);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ToolStatus::Cancelled
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error() {
        let err = ToolError::not_found("generate_image").with_details("disabled in config");

        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.message.contains("generate_image"));
        assert_eq!(
            err.to_string(),
            "[NOT_FOUND] Not found: generate_image (disabled in config)"
        );
    }

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("generate_image", "saved")
            .with_paths(vec!["images/image_1.png".to_string()]);

        assert!(result.is_success());
        assert!(!result.is_cancelled());
        assert_eq!(result.output(), Some("saved"));
        assert_eq!(result.metadata.paths.len(), 1);
    }

    #[test]
    fn test_tool_result_cancelled_with_reason() {
        let result = ToolResult::cancelled("generate_image", "Image generation", Some("make it blue"));

        assert!(result.is_cancelled());
        assert!(result.error().is_none());
        assert_eq!(
            result.output(),
            Some("Image generation cancelled by user. User modification: make it blue")
        );
    }

    #[test]
    fn test_tool_result_cancelled_without_reason() {
        let result = ToolResult::cancelled("delete_artifacts", "Deletion", None);
        assert_eq!(result.output(), Some("Deletion cancelled by user."));
    }

    #[test]
    fn test_tool_result_failure() {
        let result = ToolResult::failure("synthesize_speech", ToolError::timeout("approval"));

        assert!(!result.is_success());
        assert_eq!(result.status, ToolStatus::Failure);
        assert_eq!(result.error().unwrap().code, "TIMEOUT");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(ToolResult::cancelled("x", "X", None)).unwrap();
        assert_eq!(json["status"], "cancelled");
    }
}
