//! `audio_record.json`: the workspace-wide line number record
//!
//! Sits at the workspace root beside the session directories. Writes go to a
//! temporary file that is renamed over the record.

use async_trait::async_trait;
use mmagent_application::{ArtifactError, LineLedger};
use mmagent_domain::{LineEntry, LineRecord};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const LINE_RECORD_FILE: &str = "audio_record.json";

pub struct JsonLineLedger {
    path: PathBuf,
    first_number: u32,
    /// Serializes read-modify-write in `append`.
    write_lock: Mutex<()>,
}

impl JsonLineLedger {
    /// Ledger stored as `audio_record.json` under `workspace_root`.
    pub fn new(workspace_root: impl AsRef<Path>, first_number: u32) -> Self {
        Self {
            path: workspace_root.as_ref().join(LINE_RECORD_FILE),
            first_number,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_record(&self, record: &LineRecord) -> Result<(), ArtifactError> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| ArtifactError::Io(format!("{}: {}", LINE_RECORD_FILE, e)))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_error)
    }
}

fn io_error(err: std::io::Error) -> ArtifactError {
    ArtifactError::Io(format!("{}: {}", LINE_RECORD_FILE, err))
}

#[async_trait]
impl LineLedger for JsonLineLedger {
    async fn read(&self) -> Result<LineRecord, ArtifactError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(LineRecord::empty(self.first_number));
            }
            Err(e) => return Err(io_error(e)),
        };
        match serde_json::from_slice::<LineRecord>(&raw) {
            Ok(mut record) => {
                record.next_number = record.next_number.max(self.first_number);
                Ok(record)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable line record, starting over");
                Ok(LineRecord::empty(self.first_number))
            }
        }
    }

    async fn append(&self, entries: Vec<LineEntry>) -> Result<(), ArtifactError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read().await?;
        let added = entries.len();
        record.append(entries);
        self.write_record(&record).await?;
        debug!(added, next_number = record.next_number, "Line record updated");
        Ok(())
    }
}
