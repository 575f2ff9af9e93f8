//! Line ledger port
//!
//! Workspace-wide record of synthesized dialogue lines. Line numbers are
//! unique across sessions, so the record lives outside any one session.

use crate::ports::artifact_store::ArtifactError;
use async_trait::async_trait;
use mmagent_domain::{LineEntry, LineRecord};

#[async_trait]
pub trait LineLedger: Send + Sync {
    /// Current record. A missing or unreadable record reads as empty.
    async fn read(&self) -> Result<LineRecord, ArtifactError>;

    /// Add `entries` and advance the next number past them.
    async fn append(&self, entries: Vec<LineEntry>) -> Result<(), ArtifactError>;
}
