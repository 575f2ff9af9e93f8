//! Artifact workspace and log file locations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[workspace]`: where session artifacts are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkspaceConfig {
    pub root: PathBuf,
}

impl Default for FileWorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("workspace"),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL audit trail of approval decisions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,
    /// Diagnostic log file (in addition to stderr)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}
