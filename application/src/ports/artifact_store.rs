//! Artifact store port
//!
//! Session-scoped file storage for generated artifacts. Paths are relative
//! to the session root; implementations reject anything that escapes it.

use async_trait::async_trait;
use mmagent_domain::ArtifactEntry;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Invalid artifact path: {0}")]
    InvalidPath(String),

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Artifact I/O error: {0}")]
    Io(String),
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes`, creating parent directories as needed.
    async fn write(&self, session_id: &str, path: &str, bytes: &[u8])
    -> Result<(), ArtifactError>;

    async fn read(&self, session_id: &str, path: &str) -> Result<Vec<u8>, ArtifactError>;

    /// List a directory. A missing directory lists as empty.
    async fn list(&self, session_id: &str, dir: &str) -> Result<Vec<ArtifactEntry>, ArtifactError>;

    async fn delete(&self, session_id: &str, path: &str) -> Result<(), ArtifactError>;

    /// Absolute location of `path`, without touching the filesystem.
    fn resolve_path(&self, session_id: &str, path: &str) -> Result<PathBuf, ArtifactError>;
}
